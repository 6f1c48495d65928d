//! Offline calculator commands.
//!
//! These run the estimation pipeline against the local pricing tables
//! (`SITECOST_PRICING_FILE` or the built-in reference tables). Only
//! `--save` touches the network.

use std::sync::Arc;

use clap::{Args, Subcommand};

use super::{api_client, output::print_result};
use crate::client::EstimateStore;
use crate::client::api::EstimateDraft;
use crate::config::Config;
use crate::estimation::{
    AreaPaintInput, AreaUnit, BrickInput, ConstructionInput, Estimator, LengthUnit, PlotSpec,
    RawMaterialInput, ReadyMixInput, RegionRef, SlabInput, WallPaintInput,
};
use crate::pricing::{ConcreteGrade, QualityTier};

/// Region selector shared by the regional calculators.
#[derive(Args, Debug, Clone, Default)]
pub struct RegionArgs {
    /// State whose prices to use (defaults to the tables' default state)
    #[arg(long)]
    pub state: Option<String>,

    /// City within the state
    #[arg(long)]
    pub city: Option<String>,
}

impl From<RegionArgs> for RegionRef {
    fn from(args: RegionArgs) -> Self {
        RegionRef {
            state: args.state,
            city: args.city,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CalcCommand {
    /// Construction cost of a plot by quality tier
    Construction {
        /// Plot length in feet
        #[arg(long)]
        length: f64,

        /// Plot breadth in feet
        #[arg(long)]
        breadth: f64,

        #[arg(long, default_value_t = 1)]
        floors: u32,

        /// basic, standard, premium or luxury
        #[arg(long, default_value_t = QualityTier::Standard)]
        quality: QualityTier,

        /// Save the result under this project name
        #[arg(long, value_name = "PROJECT")]
        save: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Cement, sand and aggregate for a concrete slab
    Slab {
        #[arg(long)]
        length: f64,

        #[arg(long)]
        breadth: f64,

        #[arg(long, default_value_t = 0.15)]
        thickness: f64,

        /// meters or feet
        #[arg(long, default_value_t = LengthUnit::Meters)]
        unit: LengthUnit,

        /// M10, M15, M20 or M25
        #[arg(long, default_value_t = ConcreteGrade::M15)]
        grade: ConcreteGrade,

        #[command(flatten)]
        region: RegionArgs,

        #[arg(long)]
        json: bool,
    },

    /// Raw materials for a built-up area
    Raw {
        #[arg(long)]
        area: f64,

        /// sqft or sqyd
        #[arg(long, default_value_t = AreaUnit::Sqft)]
        unit: AreaUnit,

        #[command(flatten)]
        region: RegionArgs,

        #[arg(long)]
        json: bool,
    },

    /// Paint for a known area, or for a wall with doors and windows
    Paint {
        /// Paintable area in square feet (skips the wall geometry)
        #[arg(long, conflicts_with_all = ["wall_height", "wall_width"])]
        area: Option<f64>,

        /// Wall height in feet
        #[arg(long, requires = "wall_width")]
        wall_height: Option<f64>,

        /// Wall width in feet
        #[arg(long, requires = "wall_height")]
        wall_width: Option<f64>,

        #[arg(long, default_value_t = 0)]
        doors: u32,

        /// Door size as WIDTHxHEIGHT in feet
        #[arg(long)]
        door_size: Option<String>,

        #[arg(long, default_value_t = 0)]
        windows: u32,

        /// Window size as WIDTHxHEIGHT in feet
        #[arg(long)]
        window_size: Option<String>,

        #[arg(long)]
        coats: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Ready-mix concrete volume and cost (dimensions in metres)
    ReadyMix {
        #[arg(long)]
        height: f64,

        #[arg(long)]
        width: f64,

        #[arg(long)]
        depth: f64,

        #[command(flatten)]
        region: RegionArgs,

        #[arg(long)]
        json: bool,
    },

    /// Bricks for a wall
    Bricks {
        /// Wall length in feet
        #[arg(long)]
        length: f64,

        /// Wall height in feet
        #[arg(long)]
        height: f64,

        /// Wall thickness in metres
        #[arg(long, default_value_t = 0.23)]
        thickness: f64,

        /// Price per brick (defaults to the region's price)
        #[arg(long)]
        price: Option<f64>,

        #[command(flatten)]
        region: RegionArgs,

        #[arg(long)]
        json: bool,
    },

    /// Itemised material and labor breakdown
    Detailed {
        /// Plot width in feet
        #[arg(long)]
        width: f64,

        /// Plot length in feet
        #[arg(long)]
        length: f64,

        #[arg(long, default_value_t = 1)]
        floors: u32,

        #[arg(long, default_value_t = QualityTier::Standard)]
        quality: QualityTier,

        /// Override a line item, e.g. `steel.price=70` or `plumbing=50000`
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, f64)>,

        /// Save the result under this project name
        #[arg(long, value_name = "PROJECT")]
        save: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

/// Run a calculator command.
pub async fn run_calc_command(cmd: CalcCommand, config: &Config) -> anyhow::Result<()> {
    let estimator = Estimator::new(Arc::new(config.load_pricing()?));

    match cmd {
        CalcCommand::Construction {
            length,
            breadth,
            floors,
            quality,
            save,
            json,
        } => {
            let cost = estimator
                .construction_cost(&ConstructionInput::new(length, breadth, floors, quality))?;
            print_result(&cost, json)?;
            if let Some(project) = save {
                let draft = EstimateDraft::from_construction(project, length, breadth, &cost)?;
                save_draft(config, draft).await?;
            }
            Ok(())
        }
        CalcCommand::Slab {
            length,
            breadth,
            thickness,
            unit,
            grade,
            region,
            json,
        } => {
            let input = SlabInput {
                length,
                breadth,
                thickness,
                unit,
                grade,
            };
            print_result(&estimator.concrete_slab(&input, &region.into())?, json)
        }
        CalcCommand::Raw {
            area,
            unit,
            region,
            json,
        } => {
            let input = RawMaterialInput { area, unit };
            print_result(&estimator.raw_materials(&input, &region.into())?, json)
        }
        CalcCommand::Paint {
            area,
            wall_height,
            wall_width,
            doors,
            door_size,
            windows,
            window_size,
            coats,
            json,
        } => {
            let estimate = match (area, wall_height, wall_width) {
                (Some(area), _, _) => estimator.area_paint(&AreaPaintInput { area, coats }, None)?,
                (None, Some(wall_height), Some(wall_width)) => {
                    estimator.wall_paint(&WallPaintInput {
                        wall_height,
                        wall_width,
                        door_count: doors,
                        door_dimensions: door_size,
                        window_count: windows,
                        window_dimensions: window_size,
                        coats,
                    })?
                }
                _ => anyhow::bail!("Provide --area, or both --wall-height and --wall-width"),
            };
            print_result(&estimate, json)
        }
        CalcCommand::ReadyMix {
            height,
            width,
            depth,
            region,
            json,
        } => {
            let input = ReadyMixInput {
                height,
                width,
                depth,
            };
            print_result(&estimator.ready_mix(&input, &region.into())?, json)
        }
        CalcCommand::Bricks {
            length,
            height,
            thickness,
            price,
            region,
            json,
        } => {
            let input = BrickInput {
                wall_length: length,
                wall_height: height,
                wall_thickness: thickness,
            };
            print_result(&estimator.bricks(&input, price, &region.into())?, json)
        }
        CalcCommand::Detailed {
            width,
            length,
            floors,
            quality,
            overrides,
            save,
            json,
        } => {
            let plot = PlotSpec {
                width,
                length,
                floors,
            };
            let mut ctx = estimator.detailed(&plot, quality)?;
            for (key, value) in &overrides {
                ctx.apply_override(key, *value)?;
            }
            let breakdown = ctx.recompute();
            print_result(&breakdown, json)?;
            if let Some(project) = save {
                let draft = EstimateDraft::from_detailed(project, &plot, &breakdown)?;
                save_draft(config, draft).await?;
            }
            Ok(())
        }
    }
}

async fn save_draft(config: &Config, draft: EstimateDraft) -> anyhow::Result<()> {
    let mut store = EstimateStore::new(api_client(config));
    store.remember(draft);
    let saved = store.save_last().await?;
    println!();
    println!("Saved estimate #{} ({})", saved.id, saved.project_name);
    Ok(())
}

/// Parse `key=value` with a numeric value.
fn parse_override(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("override key is empty".to_string());
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {}: {}", key, e))?;
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(subcommand)]
        cmd: CalcCommand,
    }

    fn parse(args: &[&str]) -> CalcCommand {
        let mut argv = vec!["calc"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().cmd
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("steel.price=70"), Ok(("steel.price".to_string(), 70.0)));
        assert_eq!(parse_override(" plumbing = 5e4 "), Ok(("plumbing".to_string(), 50000.0)));
        assert!(parse_override("steel").is_err());
        assert!(parse_override("=3").is_err());
        assert!(parse_override("steel=lots").is_err());
    }

    #[test]
    fn test_construction_defaults() {
        match parse(&["construction", "--length", "30", "--breadth", "40"]) {
            CalcCommand::Construction {
                floors,
                quality,
                save,
                json,
                ..
            } => {
                assert_eq!(floors, 1);
                assert_eq!(quality, QualityTier::Standard);
                assert_eq!(save, None);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_slab_region_flags() {
        match parse(&[
            "slab", "--length", "10", "--breadth", "5", "--grade", "m20", "--unit", "feet",
            "--state", "Karnataka", "--city", "Bengaluru",
        ]) {
            CalcCommand::Slab {
                grade,
                unit,
                thickness,
                region,
                ..
            } => {
                assert_eq!(grade, ConcreteGrade::M20);
                assert_eq!(unit, LengthUnit::Feet);
                assert_eq!(thickness, 0.15);
                let region: RegionRef = region.into();
                assert_eq!(region.state.as_deref(), Some("Karnataka"));
                assert_eq!(region.city.as_deref(), Some("Bengaluru"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_paint_area_conflicts_with_wall() {
        let result = Harness::try_parse_from([
            "calc", "paint", "--area", "100", "--wall-height", "10", "--wall-width", "12",
        ]);
        assert!(result.is_err());
        let result = Harness::try_parse_from(["calc", "paint", "--wall-height", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_detailed_collects_overrides() {
        match parse(&[
            "detailed", "--width", "30", "--length", "40", "--set", "steel.price=70", "--set",
            "plumbing=50000",
        ]) {
            CalcCommand::Detailed { overrides, .. } => {
                assert_eq!(
                    overrides,
                    vec![("steel.price".to_string(), 70.0), ("plumbing".to_string(), 50000.0)]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_offline_calculators_run() {
        let config = Config::from_lookup(|_| None).unwrap();
        run_calc_command(
            parse(&["ready-mix", "--height", "1", "--width", "1", "--depth", "1", "--json"]),
            &config,
        )
        .await
        .unwrap();
        let unknown = parse(&[
            "ready-mix", "--height", "1", "--width", "1", "--depth", "1", "--state", "Atlantis",
        ]);
        let err = run_calc_command(unknown, &config).await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("atlantis"));
    }
}
