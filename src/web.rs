//! WebAssembly 绑定
//!
//! 在浏览器中由 JS 端持有 `WasmGalaxy`，调试面板的每次修改调用
//! `set_parameter`，绘制时读取 `positions` / `colors` 交给 WebGL。

use crate::config::GenerationConfig;
use crate::galaxy::controller::GalaxyGenerator;
use crate::galaxy::parameters::{GalaxyParameters, ParameterKey, ParameterValue};
use crate::render::backend::HeadlessBackend;
use wasm_bindgen::prelude::*;

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 浏览器端星系
#[wasm_bindgen]
pub struct WasmGalaxy {
    generator: GalaxyGenerator<HeadlessBackend>,
}

#[wasm_bindgen]
impl WasmGalaxy {
    /// 使用默认参数创建
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmGalaxy, JsValue> {
        let generator = GalaxyGenerator::new(
            GalaxyParameters::default(),
            GenerationConfig::default(),
            HeadlessBackend::new(),
        )
        .map_err(to_js)?;
        Ok(Self { generator })
    }

    /// 写入参数并重新生成，例如 `set_parameter("branchCount", "5")`
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), JsValue> {
        let key: ParameterKey = key.parse().map_err(to_js)?;
        let value = ParameterValue::parse_for(key, value).map_err(to_js)?;
        self.generator.set_parameter(key, value).map_err(to_js)
    }

    /// 以当前参数重新生成
    pub fn regenerate(&mut self) -> Result<(), JsValue> {
        let params = self.generator.params().clone();
        self.generator.regenerate(params).map_err(to_js)
    }

    /// 当前参数的 JSON
    pub fn parameters(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.generator.params()).map_err(to_js)
    }

    /// 平铺的位置数据 `[x0, y0, z0, x1, ...]`
    pub fn positions(&self) -> Vec<f32> {
        self.generator
            .live_field()
            .map(|field| field.position_data().to_vec())
            .unwrap_or_default()
    }

    /// 颜色数据 `[r0, g0, b0, r1, ...]`
    pub fn colors(&self) -> Vec<f32> {
        self.generator
            .live_field()
            .map(|field| field.color_data().to_vec())
            .unwrap_or_default()
    }

    pub fn particle_count(&self) -> usize {
        self.generator.live_field().map_or(0, |field| field.len())
    }
}
