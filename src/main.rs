use clap::{Parser, Subcommand};
use infer_lens::commands::inference as commands;
use infer_lens::models::view_types::StatusLine;
use infer_lens::{config, telemetry, AppState, ModelConfig, ModelKind};

#[derive(Parser)]
#[command(name = "infer-lens")]
#[command(about = "Load a model into the inference backend and classify images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a model, then run single-image and/or batch inference
    Run {
        /// Model file (.onnx, .pt, .pth)
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "onnx")]
        kind: ModelKind,
        /// Class names file (.json or .txt)
        #[arg(long)]
        classes: Option<String>,
        /// Image to classify
        #[arg(long)]
        image: Option<String>,
        /// Directory to classify in one batch
        #[arg(long)]
        dir: Option<String>,
    },
    /// Print the file picker filters as JSON
    Filters,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Filters => {
            println!(
                "{}",
                serde_json::to_string_pretty(&commands::get_dialog_filters())?
            );
        }
        Commands::Run {
            model,
            kind,
            classes,
            image,
            dir,
        } => {
            let config = config::get_configuration()?;
            telemetry::init_subscriber(config.log_level);

            let state = AppState::from_config(&config).await?;
            let mut model_config = ModelConfig::new(model, kind);
            if let Some(classes) = classes {
                model_config = model_config.with_class_names(classes);
            }

            println!("{}", StatusLine::loading(format!("Loading {}", model_config.path)));
            let (status, response) = commands::load_model(&state, model_config).await;
            println!("{}", status);
            if !response.is_success() {
                state.shutdown().await;
                return Err(response.message().to_string().into());
            }

            let single = async {
                match &image {
                    Some(path) => {
                        println!("{}", commands::stage_image_path(&state, path).await);
                        Some(commands::infer_single_image(&state).await)
                    }
                    None => None,
                }
            };
            let batch = async {
                match &dir {
                    Some(dir) => Some(commands::batch_inference(&state, dir).await),
                    None => None,
                }
            };
            let (single, batch) = futures::join!(single, batch);

            if let Some(view) = single {
                print!("{}", view);
            }
            if let Some(view) = batch {
                print!("{}", view);
            }

            state.shutdown().await;
        }
    }

    Ok(())
}
