use clap::Parser;
use konark::{AssetOptions, Runtime, RuntimeWindowOptions};

mod program_args;
use program_args::ProgramArgs;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ProgramArgs::try_parse()?;

    let assets = AssetOptions {
        base_path: args.assets.base_path,
        models: args.assets.models,
        environment: (!args.assets.no_environment).then_some(args.assets.environment),
        decoder_path: args.assets.decoder_path,
        ..Default::default()
    };
    log::debug!("Assets: {:?}", assets);

    let mut runtime_builder = Runtime::builder()
        .with_application_name("konark-viewer")
        .with_window_options(RuntimeWindowOptions {
            width: args.window.width,
            height: args.window.height,
            title: args.window.title,
            ..Default::default()
        })
        .with_assets(assets)
        .with_preset(args.preset);
    if let Some(intensity) = args.env_intensity {
        runtime_builder = runtime_builder.with_env_map_intensity(intensity);
    }

    runtime_builder.build()?.run()
}
