//! 配置类型共用的宏

/// 以字段列表的形式为配置结构体生成 `Default` 实现
///
/// ```ignore
/// impl_default!(GenerationConfig {
///     seed: None,
///     background: false,
///     max_particle_count: 1_000_000,
/// });
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
