use crate::groove::groove::StepParams;
use crate::motion::filter::FrameFilter;
use crate::motion::pd::PdGains;
use crate::spacetime::configuration::{JointConfiguration, DEFAULT_MUTABLE_START, DEFAULT_QPOS_SIZE};
use crate::spacetime::robot::BodyId;
use crate::Error;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

fn default_qpos_size() -> usize {
    DEFAULT_QPOS_SIZE
}

fn default_mutable_start() -> usize {
    DEFAULT_MUTABLE_START
}

fn default_root_body() -> usize {
    1
}

fn default_rounds() -> usize {
    100
}

/// Settings file as written on disk.
#[derive(Deserialize, Debug, Clone)]
struct SettingsFile {
    urdf: String,
    body_links: Vec<String>,
    joint_indices: Vec<usize>,
    #[serde(default = "default_root_body")]
    root_body: usize,
    #[serde(default = "default_qpos_size")]
    qpos_size: usize,
    #[serde(default = "default_mutable_start")]
    mutable_start: usize,
    starting_config: Option<Vec<f64>>,
    #[serde(default = "default_rounds")]
    rounds: usize,
    #[serde(default)]
    step: StepParams,
    #[serde(default)]
    pd: PdGains,
    #[serde(default)]
    filter: FrameFilter,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub robot_urdf_path: PathBuf,
    /// link name of every body id, `"world"` for the fixed frame
    pub body_links: Vec<String>,
    /// configuration coordinate read by each movable joint of the chain
    pub joint_indices: Vec<usize>,
    pub root_body: BodyId,
    pub qpos_size: usize,
    pub mutable_start: usize,
    pub starting_config: Vec<f64>,
    /// optimizer sweeps per simulation step
    pub rounds: usize,
    pub step: StepParams,
    pub pd: PdGains,
    pub filter: FrameFilter,
}

impl Config {
    /// Reads a TOML settings file. The URDF is looked up in the `urdfs`
    /// directory next to it.
    pub fn from_settings_file<P: AsRef<Path>>(path_to_setting: P) -> Result<Self, Error> {
        let path = path_to_setting.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut urdf_dir = PathBuf::from(path);
        urdf_dir.set_file_name("urdfs");
        Self::from_toml_str(&contents, &urdf_dir)
    }

    pub fn from_toml_str(contents: &str, urdf_dir: &Path) -> Result<Self, Error> {
        let settings: SettingsFile = toml::from_str(contents)?;
        let SettingsFile {
            urdf,
            body_links,
            joint_indices,
            root_body,
            qpos_size,
            mutable_start,
            starting_config,
            rounds,
            step,
            pd,
            filter,
        } = settings;

        if mutable_start < 3 || mutable_start > qpos_size {
            return Err(Error::InvalidSettings(format!(
                "mutable_start {mutable_start} must be in [3, {qpos_size}]"
            )));
        }
        if let Some(&bad) = joint_indices.iter().find(|&&i| i < mutable_start || i >= qpos_size) {
            return Err(Error::InvalidSettings(format!(
                "joint index {bad} outside of the actuated range [{mutable_start}, {qpos_size})"
            )));
        }
        if root_body >= body_links.len() {
            return Err(Error::InvalidSettings(format!(
                "root_body {root_body} but only {} body links",
                body_links.len()
            )));
        }
        if filter.scale.is_nan() || filter.scale <= 0.0 {
            return Err(Error::InvalidSettings("filter scale must be positive".to_string()));
        }

        let zeros = JointConfiguration::zeros(qpos_size, mutable_start).to_vec();
        let starting_config = match starting_config {
            None => {
                warn!("No starting config provided, using all zeros");
                zeros
            }
            Some(values) if values.len() > qpos_size => {
                return Err(Error::ConfigurationSize {
                    expected: qpos_size,
                    found: values.len(),
                });
            }
            Some(mut values) => {
                if values.len() < qpos_size {
                    warn!(
                        "Starting config not same size as qpos ({:?} vs {:?}), padding with zeros",
                        values.len(),
                        qpos_size
                    );
                    values.extend_from_slice(&zeros[values.len()..]);
                }
                values
            }
        };

        Ok(Self {
            robot_urdf_path: urdf_dir.join(urdf),
            body_links,
            joint_indices,
            root_body: BodyId(root_body),
            qpos_size,
            mutable_start,
            starting_config,
            rounds,
            step,
            pd,
            filter,
        })
    }

    pub fn starting_configuration(&self) -> JointConfiguration {
        JointConfiguration::from_vec(self.starting_config.clone(), self.mutable_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
urdf = "biped.urdf"
body_links = ["world", "pelvis", "left_foot"]
joint_indices = [15, 16]
"#;

    #[test]
    fn defaults_are_filled_in() {
        let config = Config::from_toml_str(MINIMAL, Path::new("configs/urdfs")).unwrap();
        assert_eq!(config.robot_urdf_path, PathBuf::from("configs/urdfs/biped.urdf"));
        assert_eq!(config.root_body, BodyId(1));
        assert_eq!(config.qpos_size, 35);
        assert_eq!(config.mutable_start, 15);
        assert_eq!(config.rounds, 100);
        assert_eq!(config.step, StepParams::default());
        assert_eq!(config.pd, PdGains::default());
        assert_eq!(config.filter, FrameFilter::default());
        let q = config.starting_configuration();
        assert_eq!(q.len(), 35);
        assert_eq!(q[3], 1.0);
    }

    #[test]
    fn sections_override_defaults() {
        let text = format!("{MINIMAL}rounds = 20\n[pd]\nk1 = 5.0\n[filter]\nspan = 4\n");
        let config = Config::from_toml_str(&text, Path::new("urdfs")).unwrap();
        assert_eq!(config.rounds, 20);
        assert_eq!(config.pd, PdGains { k1: 5.0, k2: PdGains::default().k2 });
        assert_eq!(config.filter.span, 4);
        assert_eq!(config.filter.scale, FrameFilter::default().scale);
    }

    #[test]
    fn short_starting_config_is_padded() {
        let text = format!("{MINIMAL}starting_config = [0.0, 0.0, 1.0]\n");
        let config = Config::from_toml_str(&text, Path::new("urdfs")).unwrap();
        assert_eq!(config.starting_config.len(), 35);
        assert_eq!(&config.starting_config[..4], &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn joint_in_fixed_range_is_rejected() {
        let text = MINIMAL.replace("[15, 16]", "[2, 16]");
        let res = Config::from_toml_str(&text, Path::new("urdfs"));
        assert!(matches!(res, Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn nan_filter_scale_is_rejected() {
        let text = format!("{MINIMAL}[filter]\nscale = nan\n");
        let res = Config::from_toml_str(&text, Path::new("urdfs"));
        assert!(matches!(res, Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn long_starting_config_is_rejected() {
        let text = format!("{MINIMAL}starting_config = {:?}\n", vec![0.0; 40]);
        let res = Config::from_toml_str(&text, Path::new("urdfs"));
        assert!(matches!(res, Err(Error::ConfigurationSize { expected: 35, found: 40 })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let res = Config::from_settings_file("does/not/exist.toml");
        assert!(matches!(res, Err(Error::SettingsIo { .. })));
    }
}
