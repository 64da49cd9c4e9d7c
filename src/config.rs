//! Startup configuration from command-line arguments

use flock_core::{align_to_work_group, DEFAULT_PARTICLE_COUNT, WORK_GROUP_SIZE};
use flock_renderer::PointMode;
use flock_simulation::ShaderFailurePolicy;
use std::path::PathBuf;

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

pub const USAGE: &str = "usage: gpgpu-flocking [COUNT] [--update-shader PATH] [--render-shader PATH] \
[--strict-shaders] [--native-points] [--size WxH] [--vsync]";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Always a multiple of the workgroup size, except for zero
    pub particle_count: u32,
    pub update_shader: Option<PathBuf>,
    pub render_shader: Option<PathBuf>,
    pub shader_policy: ShaderFailurePolicy,
    pub point_mode: PointMode,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            particle_count: align_to_work_group(DEFAULT_PARTICLE_COUNT),
            update_shader: None,
            render_shader: None,
            shader_policy: ShaderFailurePolicy::Degrade,
            point_mode: PointMode::Sprite,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: false,
        }
    }
}

impl AppConfig {
    /// Parse process arguments, skipping the program name
    pub fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    /// Parse `args`. Bad values are reported and replaced by defaults.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--update-shader" => match args.next() {
                    Some(path) => config.update_shader = Some(PathBuf::from(path)),
                    None => log::warn!("--update-shader needs a path"),
                },
                "--render-shader" => match args.next() {
                    Some(path) => config.render_shader = Some(PathBuf::from(path)),
                    None => log::warn!("--render-shader needs a path"),
                },
                "--strict-shaders" => config.shader_policy = ShaderFailurePolicy::Abort,
                "--native-points" => config.point_mode = PointMode::Native,
                "--vsync" => config.vsync = true,
                "--size" => match args.next().as_deref().and_then(parse_size) {
                    Some((width, height)) => {
                        config.width = width;
                        config.height = height;
                    }
                    None => log::warn!(
                        "--size expects WIDTHxHEIGHT, using {}x{}",
                        DEFAULT_WIDTH,
                        DEFAULT_HEIGHT
                    ),
                },
                flag if flag.starts_with("--") => {
                    log::warn!("Ignoring unknown option {}", flag);
                    log::warn!("{}", USAGE);
                }
                count => match count.parse::<u32>() {
                    Ok(requested) => config.particle_count = particle_count(requested),
                    Err(_) => log::warn!(
                        "Invalid particle count {:?}, using {}",
                        count,
                        config.particle_count
                    ),
                },
            }
        }

        config
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

/// Round a requested count up to whole workgroups
fn particle_count(requested: u32) -> u32 {
    let aligned = align_to_work_group(requested.min(u32::MAX - WORK_GROUP_SIZE + 1));
    if aligned != requested {
        log::warn!(
            "Particle count {} rounded up to {} to fill whole workgroups",
            requested,
            aligned
        );
    }
    aligned
}

fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.split_once(['x', 'X'])?;
    let width = width.trim().parse::<u32>().ok().filter(|w| *w > 0)?;
    let height = height.trim().parse::<u32>().ok().filter(|h| *h > 0)?;
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        AppConfig::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.particle_count, 60_032);
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.shader_policy, ShaderFailurePolicy::Degrade);
        assert_eq!(config.point_mode, PointMode::Sprite);
        assert_eq!(config.present_mode(), wgpu::PresentMode::AutoNoVsync);
    }

    #[test]
    fn test_count_is_rounded_up() {
        assert_eq!(parse(&["100"]).particle_count, 128);
        assert_eq!(parse(&["256"]).particle_count, 256);
        assert_eq!(parse(&["0"]).particle_count, 0);
    }

    #[test]
    fn test_invalid_count_keeps_default() {
        assert_eq!(parse(&["lots"]).particle_count, AppConfig::default().particle_count);
        assert_eq!(parse(&["-5"]).particle_count, AppConfig::default().particle_count);
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "1024",
            "--update-shader",
            "update.wgsl",
            "--render-shader",
            "points.wgsl",
            "--strict-shaders",
            "--native-points",
            "--size",
            "800x600",
            "--vsync",
        ]);
        assert_eq!(config.particle_count, 1024);
        assert_eq!(config.update_shader, Some(PathBuf::from("update.wgsl")));
        assert_eq!(config.render_shader, Some(PathBuf::from("points.wgsl")));
        assert_eq!(config.shader_policy, ShaderFailurePolicy::Abort);
        assert_eq!(config.point_mode, PointMode::Native);
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.present_mode(), wgpu::PresentMode::AutoVsync);
    }

    #[test]
    fn test_bad_size_keeps_default() {
        for size in ["800", "0x600", "axb"] {
            let config = parse(&["--size", size]);
            assert_eq!((config.width, config.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        }
    }

    #[test]
    fn test_missing_value_is_ignored() {
        let config = parse(&["--update-shader"]);
        assert_eq!(config.update_shader, None);
    }
}
