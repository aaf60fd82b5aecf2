use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;
use vpn_servername::{
    config::{load_writer_config, WriterConfig},
    filelog, Convention,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_writer_config(cli.config)?;
    match cli.cmd {
        Cmd::Init => {
            println!("convention={} sidecar_suffix={}", cfg.convention, cfg.sidecar_suffix);
            match &cfg.log_file {
                Some(log_file) => println!("audit log: {}", log_file),
                None => println!("audit log: disabled"),
            }
        }
        Cmd::Write { outfile, server_name, convention } => {
            let path = cfg.writer(convention).write(&outfile, &server_name)?;
            println!("{}", path.display());
            audit(&cfg, &format!("Wrote server name {} to {}", server_name, path.display()));
        }
        Cmd::Show { outfile, convention } => {
            println!("{}", cfg.writer(convention).read(&outfile)?);
        }
        Cmd::Remove { outfile, convention } => {
            let writer = cfg.writer(convention);
            if writer.remove(&outfile)? {
                let path = writer.target_path(&outfile);
                audit(&cfg, &format!("Removed server name record {}", path.display()));
            } else {
                println!("No server name record for {}", outfile.display());
            }
        }
    }
    Ok(())
}

fn audit(cfg: &WriterConfig, line: &str) {
    if let Some(log_file) = &cfg.log_file {
        if let Err(e) = filelog::write_line(log_file, line) {
            warn!("Could not append to {}: {}", log_file, e);
        }
    }
}

#[derive(Parser)]
#[command(name = "vpn-servername")]
#[command(version, about = "Record the VPN server a WireGuard config points at")]
struct Cli {
    /// Config file (default: servername.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the config file with defaults if it does not exist
    Init,
    Write {
        outfile: PathBuf,
        server_name: String,
        #[arg(long)]
        convention: Option<Convention>,
    },
    Show {
        outfile: PathBuf,
        #[arg(long)]
        convention: Option<Convention>,
    },
    Remove {
        outfile: PathBuf,
        #[arg(long)]
        convention: Option<Convention>,
    },
}
