//! Load a scene file, trace it and print the result
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use ray_optics::{
    objects::Optic,
    scene::{Scene, SceneConfig},
    Result,
};

mod cli;

use cli::{Args, Format};

fn run(args: &Args) -> Result<()> {
    let config = SceneConfig::from_file(&args.scene)?;
    let mut scene = Scene::from_config(config)?;
    info!(
        "loaded {} emitters and {} surfaces from {}",
        scene.chains().len(),
        scene.surfaces().len(),
        args.scene
    );
    scene.recalculate();

    match args.format {
        Format::Yaml => {
            print!("{}", serde_yaml::to_string(&scene.report(args.far))?);
        }
        Format::Text => print_text(&scene, args),
    }
    Ok(())
}

fn print_text(scene: &Scene, args: &Args) {
    println!("surfaces:");
    for (i, line) in scene.describe().iter().enumerate() {
        println!("  [{i}] {line}");
    }
    println!("chains:");
    for (i, chain) in scene.chains().iter().enumerate() {
        println!("  [{i}] {} segments", chain.len());
        for ray in chain.rays() {
            let [start, end] = ray.path(args.far);
            let target = match ray.intersection {
                Some(hit) => scene
                    .surface(hit.surface)
                    .map_or("?", |s| s.label())
                    .to_string(),
                None => "escapes".to_string(),
            };
            println!(
                "      ({:.4}, {:.4}) -> ({:.4}, {:.4})  I={:.3}  {target}",
                start[0], start[1], end[0], end[1], ray.intensity
            );
        }
    }
    if args.focal {
        match scene.focal_point() {
            Some(p) => println!("focal point: ({:.4}, {:.4})", p[0], p[1]),
            None => println!("focal point: none"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_filter())).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
