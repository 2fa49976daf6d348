use anyhow::Result;
use arm_dqn::{eval, train, ArmDqnConfig};
use arm_dqn_py_env::{Hw2Env, Hw2EnvConfig};
use arm_dqn_tensorboard::TensorboardRecorder;
use clap::Parser;
use log::info;
use std::{fs, path::Path};

const RUN_CONFIG_FILE: &str = "config.yaml";
const EVAL_RENDER_MODE: &str = "gui";

type Config = ArmDqnConfig<Hw2EnvConfig>;

/// Train or evaluate a Double DQN agent on the robotic arm
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train the agent only
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate the trained agent only
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// YAML file of the run configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Directory of the trained model, overriding the run configuration
    #[arg(short, long)]
    model_dir: Option<String>,
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match args.config.as_ref() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok(match args.model_dir.as_ref() {
        Some(model_dir) => config.model_dir(model_dir.as_str()),
        None => config,
    })
}

fn train_agent(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.model_dir)?;
    config.save(Path::new(&config.model_dir).join(RUN_CONFIG_FILE))?;

    let mut recorder = TensorboardRecorder::new(&config.model_dir);
    let history = train::<Hw2Env>(config, &mut recorder)?;
    info!("Trained the agent for {} episodes", history.len());
    Ok(())
}

fn eval_agent(config: &Config) -> Result<()> {
    let env_config = config.env_config.clone().render_mode(EVAL_RENDER_MODE);
    let rewards = eval::<Hw2Env>(config, &env_config, &config.model_dir)?;
    println!("{:?}", rewards);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.train {
        train_agent(&config)?;
    } else if args.eval {
        eval_agent(&config)?;
    } else {
        train_agent(&config)?;
        eval_agent(&config)?;
    }

    Ok(())
}
