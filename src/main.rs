use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use vcol_bake::{
    BakeOutcome, ConvertOptions, ObjExportOptions, convert,
    data_structures::model::DEFAULT_COLOR_LAYER, printability, resources,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a GLB, bake every mesh's texture to vertex colors, check it and export an OBJ
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Bake only the active object (first mesh, or --object) and export an OBJ
    Bake {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        object: Option<String>,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Report whether each mesh in a GLB or OBJ file is manifold
    Check { input: PathBuf },
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Vertex-color layer to bake into and export
    #[arg(long, default_value = DEFAULT_COLOR_LAYER)]
    layer: String,
    /// Do not write a .mtl file
    #[arg(long)]
    no_materials: bool,
    /// Do not append vertex colors to `v` records
    #[arg(long)]
    no_colors: bool,
    /// Write vertex normals
    #[arg(long)]
    normals: bool,
}

impl ExportArgs {
    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            layer_name: self.layer.clone(),
            export: ObjExportOptions {
                write_materials: !self.no_materials,
                write_colors: !self.no_colors,
                write_normals: self.normals,
                ..Default::default()
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Warning: Could not initialize logger: {}", e);
    };

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            input,
            output,
            export,
        } => {
            let summary = convert::convert(&input, &output, &export.options())
                .with_context(|| format!("converting {} to {}", input.display(), output.display()))?;
            for (name, outcome) in &summary.bakes {
                if let BakeOutcome::Skipped(reason) = outcome {
                    log::warn!("{name} was not baked: it {reason}.");
                }
            }
            println!(
                "Exported OBJ with vertex colors: {} ({} of {} objects baked)",
                output.display(),
                summary.baked_count(),
                summary.bakes.len()
            );
        }
        Command::Bake {
            input,
            output,
            object,
            export,
        } => {
            let outcome = convert::bake_and_export(&input, &output, object.as_deref(), &export.options())
                .with_context(|| format!("baking {}", input.display()))?;
            match outcome {
                Some(BakeOutcome::Baked { loops }) => {
                    println!("Texture successfully baked to vertex colors ({loops} loops): {}", output.display())
                }
                Some(BakeOutcome::Skipped(reason)) => {
                    println!("Nothing baked: the active object {reason}.")
                }
                None => println!("Nothing baked: no active object. Exported {}", output.display()),
            }
        }
        Command::Check { input } => {
            let scene = resources::load_scene(&input)
                .with_context(|| format!("loading {}", input.display()))?;
            for object in &scene.objects {
                if let Some(report) = printability::check_3d_printability(object) {
                    print!("{report}");
                }
            }
        }
    }
    Ok(())
}
