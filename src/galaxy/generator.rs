//! 螺旋星系点云生成
//!
//! 对每个粒子 `i`：
//!
//! ```text
//! r            = uniform(0, radius)
//! spin_angle   = r * spin
//! branch_angle = (i mod branch_count) / branch_count * 2π
//! offset_axis  = uniform(0,1)^randomness_power * (±1) * randomness * r
//! position     = (cos(branch + spin) * r + ox, oy, sin(branch + spin) * r + oz)
//! color        = lerp(inside, outside, r / radius)
//! ```
//!
//! 半径按线性均匀分布抽取（不是按面积），中心附近单位面积的粒子更密。
//! 旋臂按下标轮流分配，每条旋臂恰好分到 `particle_count / branch_count` 个粒子。

use super::field::ParticleField;
use super::parameters::GalaxyParameters;
use crate::core::error::GalaxyResult;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// 使用线程随机源生成粒子场
pub fn generate(params: &GalaxyParameters) -> GalaxyResult<ParticleField> {
    generate_with_rng(params, &mut rand::thread_rng())
}

/// 使用固定种子生成，结果可复现
pub fn generate_seeded(params: &GalaxyParameters, seed: u64) -> GalaxyResult<ParticleField> {
    generate_with_rng(params, &mut StdRng::seed_from_u64(seed))
}

/// 使用给定随机源生成粒子场
///
/// 参数先做结构校验，非法参数返回 `InvalidParameter`，不会产生退化输出。
/// 粒子数量上限由调用方按各自的配置检查。
pub fn generate_with_rng<R: Rng + ?Sized>(
    params: &GalaxyParameters,
    rng: &mut R,
) -> GalaxyResult<ParticleField> {
    params.validate()?;

    let count = params.particle_count as usize;
    let mut positions = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);

    let inside = params.inside_color.to_vec3();
    let outside = params.outside_color.to_vec3();

    for i in 0..count {
        let r = rng.gen::<f32>() * params.radius;

        let spin_angle = r * params.spin;
        let branch_angle = branch_angle(i, params.branch_count);
        let angle = branch_angle + spin_angle;

        let offset = Vec3::new(
            jitter(rng, params, r),
            jitter(rng, params, r),
            jitter(rng, params, r),
        );

        positions.push(Vec3::new(angle.cos() * r, 0.0, angle.sin() * r) + offset);

        // radius == 0 时所有粒子都取中心颜色
        let t = if params.radius > 0.0 {
            (r / params.radius).clamp(0.0, 1.0)
        } else {
            0.0
        };
        colors.push(inside.lerp(outside, t).clamp(Vec3::ZERO, Vec3::ONE));
    }

    tracing::trace!(target: "galaxy", "Generated {} particles", count);
    Ok(ParticleField::from_parts(positions, colors))
}

/// 下标 `index` 所属旋臂的角度
///
/// `branch_count` 必须 >= 1，参数校验保证这一点；传入 0 会 panic。
pub fn branch_angle(index: usize, branch_count: u32) -> f32 {
    debug_assert_ne!(branch_count, 0, "branch_count must be >= 1");
    let branch_count = branch_count as usize;
    (index % branch_count) as f32 / branch_count as f32 * TAU
}

/// 单轴抖动：`u^power * sign * randomness * r`
fn jitter<R: Rng + ?Sized>(rng: &mut R, params: &GalaxyParameters, r: f32) -> f32 {
    let magnitude = rng.gen::<f32>().powf(params.randomness_power);
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    magnitude * sign * params.randomness * r
}
