use super::defaults::DefaultsConfig;
use super::file::{
    FileConfig, FileDetectorConfig, FileOptionsConfig, FileRegionConfig, FileSourceConfig,
};
use super::models::AppConfig;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use nalgebra::{Point3, Vector3};
use std::path::PathBuf;
use tissuemc::core::detectors::DetectorInput;
use tissuemc::core::optics::properties::OpticalProperties;
use tissuemc::core::sources::SourceInput;
use tissuemc::core::tissue::TissueRegion;
use tissuemc::engine::config::{RouletteOptions, SimulationInput, SimulationOptions};

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let file_config = FileConfig::from_file(&args.config)?;
    build_from_file(file_config, args)
}

fn build_from_file(file_config: FileConfig, args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let sim_file = file_config.simulation.take().unwrap_or_default();
    let photon_count = args
        .photon_count
        .or(sim_file.photon_count)
        .ok_or_else(|| {
            CliError::Config(
                "A value for `simulation.photon-count` is required either in the config file or via --photon-count."
                    .to_string(),
            )
        })?;
    let output_name = sim_file
        .output_name
        .unwrap_or_else(|| defaults.output_name.clone());

    let options = merge_options(args, file_config.options.take(), &defaults);
    let tissue = build_tissue(
        file_config.tissue.take().unwrap_or_default().regions,
        &defaults,
    )?;
    let source = build_source(file_config.source.take());
    let detectors = build_detectors(std::mem::take(&mut file_config.detectors), &defaults)?;

    let input = SimulationInput::builder()
        .photon_count(photon_count)
        .output_name(output_name)
        .tissue(tissue)
        .source(source)
        .detectors(detectors)
        .options(options)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&input.output_name));

    Ok(AppConfig { output_dir, input })
}

fn merge_options(
    args: &RunArgs,
    file_val: Option<FileOptionsConfig>,
    defaults: &DefaultsConfig,
) -> SimulationOptions {
    let file_val = file_val.unwrap_or_default();
    let base = &defaults.options;
    SimulationOptions {
        absorption_weighting: args
            .absorption_weighting
            .or(file_val.absorption_weighting)
            .unwrap_or(base.absorption_weighting),
        seed: args.seed.or(file_val.seed).or(base.seed),
        roulette: RouletteOptions {
            weight_threshold: file_val
                .roulette_threshold
                .unwrap_or(base.roulette.weight_threshold),
            survival_chance: file_val
                .roulette_chance
                .unwrap_or(base.roulette.survival_chance),
        },
        max_collisions: file_val.max_collisions.unwrap_or(base.max_collisions),
        batch_size: file_val.batch_size.unwrap_or(base.batch_size),
    }
}

fn build_tissue(
    regions: Vec<FileRegionConfig>,
    defaults: &DefaultsConfig,
) -> Result<Vec<TissueRegion>> {
    if regions.is_empty() {
        return Err(CliError::Config(
            "At least one `[[tissue.regions]]` entry is required.".to_string(),
        ));
    }

    let last = regions.len() - 1;
    let mut z_prev = f64::NEG_INFINITY;
    let mut tissue = Vec::with_capacity(regions.len());
    for (i, region) in regions.into_iter().enumerate() {
        let z_min = region.z_min.unwrap_or(z_prev);
        let z_max = match region.z_max {
            Some(z) => z,
            None if i == last => f64::INFINITY,
            None => {
                return Err(CliError::Config(format!(
                    "`tissue.regions.{i}.z-max` is required on every region but the last."
                )));
            }
        };

        let n = region.n.unwrap_or(defaults.refractive_index);
        let properties = match (region.mua, region.musp, region.g) {
            (None, None, None) => OpticalProperties::ambient(n),
            (mua, musp, g) => OpticalProperties::new(
                mua.unwrap_or(0.0),
                musp.unwrap_or(0.0),
                g.unwrap_or(defaults.anisotropy),
                n,
            ),
        }
        .map_err(|e| CliError::Config(format!("tissue.regions.{i}: {e}")))?;

        tissue.push(TissueRegion::layer(z_min, z_max, properties));
        z_prev = z_max;
    }
    Ok(tissue)
}

fn build_source(file_val: Option<FileSourceConfig>) -> SourceInput {
    let Some(file_val) = file_val else {
        return SourceInput::default();
    };
    match file_val {
        FileSourceConfig::DirectionalPoint {
            position,
            direction,
            initial_region,
        } => SourceInput::DirectionalPoint {
            position: position.map(Point3::from).unwrap_or_else(Point3::origin),
            direction: direction.map(Vector3::from).unwrap_or_else(Vector3::z),
            initial_region: initial_region.unwrap_or(0),
        },
        FileSourceConfig::IsotropicPoint {
            position,
            initial_region,
        } => SourceInput::IsotropicPoint {
            position: Point3::from(position),
            initial_region,
        },
        FileSourceConfig::Distributed {
            center,
            spatial,
            angular,
            initial_region,
        } => SourceInput::Distributed {
            center: center.map(Point3::from).unwrap_or_else(Point3::origin),
            spatial: spatial.into(),
            angular: angular.unwrap_or_default().into(),
            initial_region: initial_region.unwrap_or(0),
        },
    }
}

fn build_detectors(
    file_val: Vec<FileDetectorConfig>,
    defaults: &DefaultsConfig,
) -> Result<Vec<DetectorInput>> {
    if file_val.is_empty() {
        return Ok(defaults.detectors.clone());
    }
    file_val
        .into_iter()
        .map(|detector| {
            let kind = detector.detector_kind()?;
            let input = DetectorInput::new(kind).with_second_moment(
                detector
                    .tally_second_moment
                    .unwrap_or(defaults.tally_second_moment),
            );
            Ok(match detector.name {
                Some(name) => input.with_name(name),
                None => input,
            })
        })
        .collect()
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    let config_err = |e: ParseError| CliError::Config(e.to_string());

    for kv_pair in set_values {
        let (key, value_str) = parser::parse_key_value(kv_pair).map_err(config_err)?;

        if let Some((index, field)) = parser::parse_region_key(key).map_err(config_err)? {
            let regions = &mut config.tissue.get_or_insert_with(Default::default).regions;
            let count = regions.len();
            let region = regions.get_mut(index).ok_or_else(|| {
                CliError::Config(format!(
                    "Cannot set {key}: the configuration defines {count} tissue region(s)."
                ))
            })?;
            let value = Some(parser::parse_value(key, value_str, "float").map_err(config_err)?);
            match field {
                "z-min" => region.z_min = value,
                "z-max" => region.z_max = value,
                "mua" => region.mua = value,
                "musp" => region.musp = value,
                "g" => region.g = value,
                "n" => region.n = value,
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
            continue;
        }

        match key {
            "simulation.photon-count" => {
                config
                    .simulation
                    .get_or_insert_with(Default::default)
                    .photon_count =
                    Some(parser::parse_value(key, value_str, "integer").map_err(config_err)?);
            }
            "simulation.output-name" => {
                config
                    .simulation
                    .get_or_insert_with(Default::default)
                    .output_name = Some(value_str.to_string());
            }
            "options.absorption-weighting" => {
                config
                    .options
                    .get_or_insert_with(Default::default)
                    .absorption_weighting = Some(
                    parser::parse_value(key, value_str, "absorption weighting")
                        .map_err(config_err)?,
                );
            }
            "options.seed" => {
                config.options.get_or_insert_with(Default::default).seed =
                    Some(parser::parse_value(key, value_str, "integer").map_err(config_err)?);
            }
            "options.batch-size" => {
                config.options.get_or_insert_with(Default::default).batch_size =
                    Some(parser::parse_value(key, value_str, "integer").map_err(config_err)?);
            }
            "options.max-collisions" => {
                config
                    .options
                    .get_or_insert_with(Default::default)
                    .max_collisions =
                    Some(parser::parse_value(key, value_str, "integer").map_err(config_err)?);
            }
            "options.roulette-threshold" => {
                config
                    .options
                    .get_or_insert_with(Default::default)
                    .roulette_threshold =
                    Some(parser::parse_value(key, value_str, "float").map_err(config_err)?);
            }
            "options.roulette-chance" => {
                config
                    .options
                    .get_or_insert_with(Default::default)
                    .roulette_chance =
                    Some(parser::parse_value(key, value_str, "float").map_err(config_err)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
