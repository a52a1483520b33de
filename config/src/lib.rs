use std::{fs::File, io::BufReader};
use std::path::Path;
use std::process::exit;

use clap_serde_derive::{
    clap::{self, Parser},
    ClapSerde,
};
use directories::ProjectDirs;
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Config file.  If config.yml is present, use that.  Otherwise, look in ~/.config/pipehost/config.yml
    #[arg(short = 'c', long = "config", default_value = "config.yml")]
    config_path: std::path::PathBuf,

    /// Dump the resolved config and exit
    #[arg(short = 'D', long = "dump-config", default_value = "false")]
    dump_config: bool,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Debug, Serialize)]
pub struct Config {
    /// pipehostd config: Logical pipe name to host.  Bare names land under the temp
    /// directory, absolute paths are used as-is.  Default pipehost
    #[arg(short = 'n', long = "pipe-name")]
    pub pipe_name: String,

    /// pipehostd config: Permission bits for the created pipe as an octal string,
    /// chmod style.  Default 666
    #[arg(short = 'm', long = "pipe-mode")]
    pub pipe_mode: String,
}

impl Config {
    pub fn read() -> Config {
        // Parse whole args with clap
        let mut args = Args::parse();

        let config_path = if Path::exists(&args.config_path) {
            args.config_path
        } else {
            match ProjectDirs::from("com", "pipehost", "pipehost") {
                None => args.config_path,
                Some(p) => p.config_dir().join("config.yml"),
            }
        };

        log::debug!("Attempt to read config from {:?}", config_path);

        // Get config file
        let mut config = if let Ok(f) = File::open(&config_path) {
            // Parse config with serde
            match serde_yaml::from_reader::<_, <Config as ClapSerde>::Opt>(BufReader::new(f)) {
                // merge config already parsed from clap
                Ok(config) => Config::from(config).merge(&mut args.config),
                Err(err) => panic!("Error in configuration file:\n{}", err),
            }
        } else {
            // If there is not config file return only config parsed from clap
            Config::from(&mut args.config)
        };

        // apply defaults
        if config.pipe_name.is_empty() {
            config.pipe_name = "pipehost".to_string();
        }
        if config.pipe_mode.is_empty() {
            config.pipe_mode = "666".to_string();
        }

        if args.dump_config {
            println!("# pipehost Config\n\n{}", serde_yaml::to_string(&config).expect("Failed to serialize config"));
            exit(0);
        }

        return config;
    }

    /// The configured permission mode as raw bits.
    pub fn pipe_mode_bits(&self) -> u32 {
        match u32::from_str_radix(&self.pipe_mode, 8) {
            Ok(bits) => bits,
            Err(_) => panic!("Invalid pipe mode {:?}, expected octal permission bits", self.pipe_mode),
        }
    }
}
