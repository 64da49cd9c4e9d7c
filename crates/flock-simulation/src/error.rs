//! Error types for GPU setup, program loading and simulation sizing

use std::path::PathBuf;

/// Errors raised while acquiring or talking to the GPU.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
    #[error("failed to wait for the GPU: {0}")]
    Poll(#[from] wgpu::PollError),
}

/// Errors raised while building a compute or render program.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("failed to read shader {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{label} failed to compile:\n{message}")]
    Compile { label: String, message: String },
}

/// Fatal sizing and layout violations detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("particle count must be positive")]
    Empty,
    #[error("particle count {count} is not a multiple of the workgroup size {group_size}")]
    UnalignedCount { count: u32, group_size: u32 },
    #[error("{groups} workgroups exceed the device limit of {max_groups} per dispatch dimension")]
    DispatchCapacity { groups: u32, max_groups: u32 },
    #[error("particle buffer of {size} bytes exceeds the storage binding limit of {max_size} bytes")]
    BufferTooLarge { size: u64, max_size: u64 },
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_failure_is_not_a_mapping_failure() {
        let err = GpuError::from(wgpu::PollError::Timeout);
        assert!(matches!(err, GpuError::Poll(_)));
        assert!(err.to_string().starts_with("failed to wait for the GPU"));
    }

    #[test]
    fn test_gpu_errors_nest_in_setup() {
        let err = SetupError::from(GpuError::from(wgpu::PollError::Timeout));
        assert!(matches!(err, SetupError::Gpu(GpuError::Poll(_))));
    }
}
