//! Shader program loading
//!
//! Validation errors from shader compilation and pipeline creation are caught
//! with a device error scope and returned as [`ProgramError`]. What happens
//! next is the caller's [`ShaderFailurePolicy`].

use crate::error::ProgramError;
use std::borrow::Cow;
use std::path::PathBuf;

/// Where a program's WGSL comes from
#[derive(Clone, Debug)]
pub enum ProgramSource {
    /// Source compiled into the binary
    Embedded {
        label: &'static str,
        code: &'static str,
    },
    /// Source read from disk at load time
    File(PathBuf),
}

impl ProgramSource {
    /// Use `path` when given, otherwise the embedded source
    pub fn file_or(path: Option<PathBuf>, embedded: ProgramSource) -> Self {
        path.map(ProgramSource::File).unwrap_or(embedded)
    }

    pub fn label(&self) -> String {
        match self {
            ProgramSource::Embedded { label, .. } => (*label).to_string(),
            ProgramSource::File(path) => path.display().to_string(),
        }
    }

    pub fn load(&self) -> Result<Cow<'static, str>, ProgramError> {
        match self {
            ProgramSource::Embedded { code, .. } => Ok(Cow::Borrowed(*code)),
            ProgramSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ProgramError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// What a stage does when its program fails to build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShaderFailurePolicy {
    /// Log the diagnostic and keep running with the stage disabled
    #[default]
    Degrade,
    /// Return the error to the caller
    Abort,
}

impl ShaderFailurePolicy {
    /// Apply the policy to a build result. `Ok(None)` means the stage runs
    /// without a program.
    pub fn resolve<T>(self, result: Result<T, ProgramError>) -> Result<Option<T>, ProgramError> {
        match (result, self) {
            (Ok(program), _) => Ok(Some(program)),
            (Err(error), ShaderFailurePolicy::Degrade) => {
                log::error!("{error}");
                log::error!("Continuing with the stage disabled");
                Ok(None)
            }
            (Err(error), ShaderFailurePolicy::Abort) => Err(error),
        }
    }
}

/// Run `build` inside a validation error scope.
///
/// Everything created by `build` is returned only if the device reported no
/// validation error while it ran.
pub fn build_program<T>(
    device: &wgpu::Device,
    label: &str,
    build: impl FnOnce() -> T,
) -> Result<T, ProgramError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let program = build();

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ProgramError::Compile {
            label: label.to_string(),
            message: error.to_string(),
        }),
        None => Ok(program),
    }
}

/// Load and compile a shader module from `source`.
pub fn compile_module(
    device: &wgpu::Device,
    source: &ProgramSource,
) -> Result<wgpu::ShaderModule, ProgramError> {
    let label = source.label();
    let code = source.load()?;

    build_program(device, &label, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_str()),
            source: wgpu::ShaderSource::Wgsl(code),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrade_swallows_error() {
        let result: Result<u32, ProgramError> = Err(ProgramError::Compile {
            label: "test".into(),
            message: "bad".into(),
        });
        assert!(matches!(ShaderFailurePolicy::Degrade.resolve(result), Ok(None)));
    }

    #[test]
    fn test_abort_propagates_error() {
        let result: Result<u32, ProgramError> = Err(ProgramError::Compile {
            label: "test".into(),
            message: "bad".into(),
        });
        assert!(matches!(
            ShaderFailurePolicy::Abort.resolve(result),
            Err(ProgramError::Compile { .. })
        ));
    }

    #[test]
    fn test_success_passes_through() {
        assert_eq!(ShaderFailurePolicy::Abort.resolve(Ok(3)).ok(), Some(Some(3)));
        assert_eq!(ShaderFailurePolicy::Degrade.resolve(Ok(3)).ok(), Some(Some(3)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = ProgramSource::File(PathBuf::from("/nonexistent/flock_update.wgsl"));
        assert!(matches!(source.load(), Err(ProgramError::Io { .. })));
    }

    #[test]
    fn test_file_or_prefers_path() {
        let embedded = ProgramSource::Embedded {
            label: "embedded",
            code: "",
        };
        let chosen = ProgramSource::file_or(Some(PathBuf::from("custom.wgsl")), embedded.clone());
        assert_eq!(chosen.label(), "custom.wgsl");
        assert_eq!(ProgramSource::file_or(None, embedded).label(), "embedded");
    }
}
