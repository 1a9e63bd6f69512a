mod lines;
mod pbr;
mod postproc;
mod preprocessor;
mod skybox;

pub use lines::*;
pub use pbr::*;
pub use postproc::*;
pub use preprocessor::*;
pub use skybox::*;

use std::collections::HashMap;

use crate::MAX_DIRECTIONAL_LIGHTS;

/// Preprocessor with every shared shader module registered.
pub fn shader_preprocessor() -> Result<Preprocessor, PreprocessError> {
    Ok(Preprocessor::new()?
        .with_include_module(
            "common::constants",
            include_str!("../shader/common/constants.wgsl"),
        )
        .with_include_module("common::view", include_str!("../shader/common/view.wgsl"))
        .with_include_module("common::light", include_str!("../shader/common/light.wgsl"))
        .with_include_module(
            "common::equirect",
            include_str!("../shader/common/equirect.wgsl"),
        )
        .with_include_module("common::brdf", include_str!("../shader/common/brdf.wgsl"))
        .with_include_module("common::color", include_str!("../shader/common/color.wgsl"))
        .with_include_module(
            "common::fullscreen",
            include_str!("../shader/common/fullscreen.wgsl"),
        ))
}

/// Definitions shared by every scene shader.
pub fn default_shader_defs() -> HashMap<String, ShaderValue> {
    let mut defs = HashMap::new();
    defs.insert(
        "MAX_DIRECTIONAL_LIGHTS".to_owned(),
        ShaderValue::Uint(MAX_DIRECTIONAL_LIGHTS as u32),
    );
    defs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_shaders_preprocess_without_leftover_directives() {
        let preprocessor = shader_preprocessor().unwrap();
        let mut defs = default_shader_defs();
        defs.insert("EXPOSURE".to_owned(), ShaderValue::Float(1.5));

        for source in [
            include_str!("../shader/pbr.wgsl"),
            include_str!("../shader/skybox.wgsl"),
            include_str!("../shader/lines.wgsl"),
            include_str!("../shader/tonemap.wgsl"),
        ] {
            let output = preprocessor.process(source, &defs).unwrap();
            assert!(!output.contains('#'));
            assert!(!output.contains("${"));
            assert!(output.contains("fn vs_main"));
            assert!(output.contains("fn fs_main"));
        }
    }

    #[test]
    fn tonemap_encodes_srgb_only_when_asked() {
        let preprocessor = shader_preprocessor().unwrap();
        let mut defs = default_shader_defs();
        defs.insert("EXPOSURE".to_owned(), ShaderValue::Float(1.5));

        let linear = preprocessor
            .process(include_str!("../shader/tonemap.wgsl"), &defs)
            .unwrap();
        defs.insert("ENCODE_SRGB".to_owned(), ShaderValue::Def);
        let encoded = preprocessor
            .process(include_str!("../shader/tonemap.wgsl"), &defs)
            .unwrap();

        assert!(!linear.contains("color = linear_to_srgb(color);"));
        assert!(encoded.contains("color = linear_to_srgb(color);"));
        assert!(encoded.contains("const EXPOSURE: f32 = 1.5;"));
    }
}
