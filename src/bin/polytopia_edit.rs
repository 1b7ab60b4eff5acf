use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use polytopia_save::codec::Diplomacy;
use polytopia_save::edit;
use polytopia_save::save::{json as save_json, views};
use polytopia_save::{storage, Result, SaveModel};

#[derive(Parser)]
#[command(name = "polytopia-edit")]
#[command(about = "Inspect and edit Battle of Polytopia save files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Edits work on a decompressed payload (`<save>.decomp`)
#[derive(Subcommand)]
enum Commands {
    /// Decompress a save into `<file>.decomp`
    Decompress { file: PathBuf },
    /// Compress a payload into a save container
    Compress {
        file: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    Inspect {
        file: PathBuf,
        #[arg(long)]
        offsets: bool,
    },
    ExportJson {
        file: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Load tiles and players from an export of the same map
    ImportJson {
        file: PathBuf,
        #[arg(long)]
        input: PathBuf,
    },
    /// Grow the map, adding empty tiles
    Resize {
        file: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    Reveal {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        tribe: u8,
    },
    RevealAll {
        file: PathBuf,
        #[arg(long)]
        tribe: u8,
    },
    ConvertTribe {
        file: PathBuf,
        #[arg(long)]
        from: u8,
        #[arg(long)]
        to: u8,
    },
    SwapPlayers {
        file: PathBuf,
        #[arg(long)]
        first: u8,
        #[arg(long)]
        second: u8,
    },
    AddPlayer {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Hex RGB, e.g. ff8800. Random when omitted.
        #[arg(long)]
        color: Option<String>,
    },
    SetCapital {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        name: String,
        #[arg(long)]
        tribe: u8,
    },
    AddCity {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        name: String,
        #[arg(long)]
        tribe: u8,
    },
    ResetTile {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
    },
    Terrain {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        terrain: u16,
    },
    UnitOwner {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        owner: u8,
    },
    UnitType {
        file: PathBuf,
        #[arg(long)]
        x: usize,
        #[arg(long)]
        y: usize,
        #[arg(long)]
        kind: u16,
    },
    UnlockTech {
        file: PathBuf,
        #[arg(long)]
        player: u8,
    },
    Currency {
        file: PathBuf,
        #[arg(long)]
        player: u8,
        #[arg(long)]
        amount: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(result) => {
            let out = json!({ "success": true, "result": result });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        }
        Err(e) => {
            let err = json!({ "success": false, "error": e.to_string() });
            println!("{}", serde_json::to_string_pretty(&err).unwrap_or_default());
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> std::result::Result<Value, Box<dyn std::error::Error>> {
    let result = match command {
        Commands::Decompress { file } => {
            let output = storage::decompress_file(&file)?;
            json!({ "output": output })
        }
        Commands::Compress { file, output } => {
            storage::compress_file(&file, &output)?;
            json!({ "output": output })
        }
        Commands::Inspect { file, offsets } => inspect(&file, offsets)?,
        Commands::ExportJson { file, output } => {
            save_json::export_json(&SaveModel::read_file(&file)?, &output)?;
            json!({ "output": output })
        }
        Commands::ImportJson { file, input } => {
            edit::import_json_state(&file, &input)?;
            json!({ "input": input })
        }
        Commands::Resize { file, width, height } => {
            edit::resize_map(&file, width, height)?;
            json!({ "width": width, "height": height })
        }
        Commands::Reveal { file, x, y, tribe } => {
            json!({ "changed": edit::reveal_tile(&file, x, y, tribe)? })
        }
        Commands::RevealAll { file, tribe } => {
            json!({ "revealed": edit::reveal_all_tiles(&file, tribe)? })
        }
        Commands::ConvertTribe { file, from, to } => {
            json!({ "converted": edit::convert_tribe(&file, from, to)? })
        }
        Commands::SwapPlayers { file, first, second } => {
            edit::swap_players(&file, first, second)?;
            json!({ "swapped": [first, second] })
        }
        Commands::AddPlayer { file, name, color } => {
            let color = match color {
                Some(hex) => parse_color(&hex)?,
                None => random_color()?,
            };
            json!({ "id": edit::add_player(&file, name.as_deref(), color)? })
        }
        Commands::SetCapital { file, x, y, name, tribe } => {
            edit::set_capital(&file, x, y, &name, tribe)?;
            json!({ "x": x, "y": y, "tribe": tribe })
        }
        Commands::AddCity { file, x, y, name, tribe } => {
            edit::add_city(&file, x, y, &name, tribe)?;
            json!({ "x": x, "y": y, "tribe": tribe })
        }
        Commands::ResetTile { file, x, y } => {
            edit::reset_tile(&file, x, y)?;
            json!({ "x": x, "y": y })
        }
        Commands::Terrain { file, x, y, terrain } => {
            edit::modify_tile_terrain(&file, x, y, terrain)?;
            json!({ "x": x, "y": y, "terrain": terrain })
        }
        Commands::UnitOwner { file, x, y, owner } => {
            json!({ "changed": edit::modify_unit_owner(&file, x, y, owner)? })
        }
        Commands::UnitType { file, x, y, kind } => {
            json!({ "changed": edit::modify_unit_type(&file, x, y, kind)? })
        }
        Commands::UnlockTech { file, player } => {
            edit::unlock_all_tech(&file, player)?;
            json!({ "player": player })
        }
        Commands::Currency { file, player, amount } => {
            edit::set_player_currency(&file, player, amount)?;
            json!({ "player": player, "currency": amount })
        }
    };
    Ok(result)
}

fn inspect(file: &Path, with_offsets: bool) -> Result<Value> {
    let model = SaveModel::read_file(file)?;
    let header = model.map_header_current();
    let players: Vec<Value> = model
        .players_current()
        .iter()
        .map(|p| {
            let met: Vec<Value> = p
                .diplomacy
                .iter()
                .filter_map(|d| {
                    Diplomacy::turn(d.first_meet_turn).map(|turn| json!({ "player": d.player_id, "turn": turn }))
                })
                .collect();
            json!({ "id": p.id, "name": p.name, "tribe": p.tribe, "currency": p.currency, "met": met })
        })
        .collect();

    let mut summary = json!({
        "version": model.format_version().0,
        "map_name": header.map_name,
        "turn": header.current_turn,
        "width": model.map_width(),
        "height": model.map_height(),
        "players": players,
        "cities": views::cities_by_owner(model.tiles_current())
            .into_iter()
            .map(|(owner, cities)| (owner.to_string(), json!(cities)))
            .collect::<serde_json::Map<_, _>>(),
        "units": views::units_by_owner(model.tiles_current())
            .into_iter()
            .map(|(owner, units)| (owner.to_string(), json!(units)))
            .collect::<serde_json::Map<_, _>>(),
    });

    if with_offsets {
        let offsets: serde_json::Map<String, Value> = model
            .offsets()
            .iter()
            .map(|(key, offset)| (key.to_string(), json!(offset)))
            .collect();
        summary["offsets"] = Value::Object(offsets);
    }
    Ok(summary)
}

fn parse_color(hex: &str) -> std::result::Result<[u8; 3], String> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("expected 6 hex digits, got {:?}", hex));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("bad color {:?}: {}", hex, e))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

fn random_color() -> std::result::Result<[u8; 3], String> {
    let mut buf = [0u8; 3];
    getrandom::getrandom(&mut buf).map_err(|e| format!("no random color: {}", e))?;
    Ok(buf)
}
