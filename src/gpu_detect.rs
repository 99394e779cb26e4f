//! GPU detection and availability checking.
//!
//! The teacher's version shells out per-vendor (`nvidia-smi`, `rocm-smi`,
//! Metal `Device::system_default`). `wgpu` already enumerates every backend
//! uniformly, so detection here is just reading back `Instance::enumerate_adapters`
//! and mapping its `Backend`/`DeviceType` onto the same `GpuBackend`/`GpuInfo`
//! shape the teacher exposed.

/// GPU backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuBackend {
    Metal,
    Vulkan,
    Dx12,
    Gl,
    BrowserWebGpu,
    None,
}

impl std::fmt::Display for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuBackend::Metal => write!(f, "Metal"),
            GpuBackend::Vulkan => write!(f, "Vulkan"),
            GpuBackend::Dx12 => write!(f, "DX12"),
            GpuBackend::Gl => write!(f, "OpenGL"),
            GpuBackend::BrowserWebGpu => write!(f, "WebGPU"),
            GpuBackend::None => write!(f, "None"),
        }
    }
}

impl From<wgpu::Backend> for GpuBackend {
    fn from(b: wgpu::Backend) -> Self {
        match b {
            wgpu::Backend::Metal => GpuBackend::Metal,
            wgpu::Backend::Vulkan => GpuBackend::Vulkan,
            wgpu::Backend::Dx12 => GpuBackend::Dx12,
            wgpu::Backend::Gl => GpuBackend::Gl,
            wgpu::Backend::BrowserWebGpu => GpuBackend::BrowserWebGpu,
            wgpu::Backend::Empty => GpuBackend::None,
        }
    }
}

/// GPU device information.
#[derive(Debug, Clone)]
pub struct GpuInfo {
    pub name: String,
    pub backend: GpuBackend,
    pub is_discrete: bool,
}

/// Enumerate every adapter `wgpu` can see across all backends.
pub fn enumerate_gpus() -> Vec<GpuInfo> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    instance
        .enumerate_adapters(wgpu::Backends::all())
        .map(|adapter| {
            let info = adapter.get_info();
            GpuInfo {
                name: info.name,
                backend: info.backend.into(),
                is_discrete: info.device_type == wgpu::DeviceType::DiscreteGpu,
            }
        })
        .collect()
}

/// Whether any real (non-CPU-fallback) GPU adapter is available.
pub fn gpu_available() -> bool {
    !enumerate_gpus().is_empty()
}

/// Prefer a discrete GPU, then any adapter, then `None`.
pub fn best_backend() -> GpuBackend {
    let gpus = enumerate_gpus();
    gpus.iter()
        .find(|g| g.is_discrete)
        .or_else(|| gpus.first())
        .map(|g| g.backend)
        .unwrap_or(GpuBackend::None)
}

/// Print a one-line-per-adapter detection summary, as the teacher's
/// `print_gpu_summary` did per-vendor.
pub fn print_gpu_summary() {
    let gpus = enumerate_gpus();
    if gpus.is_empty() {
        println!("GPU detection: no adapters found, falling back to CPU");
        return;
    }
    println!("GPU detection:");
    for gpu in &gpus {
        println!(
            "  {} ({}{})",
            gpu.name,
            gpu.backend,
            if gpu.is_discrete { ", discrete" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_display_matches_names() {
        assert_eq!(format!("{}", GpuBackend::Metal), "Metal");
        assert_eq!(format!("{}", GpuBackend::Vulkan), "Vulkan");
        assert_eq!(format!("{}", GpuBackend::None), "None");
    }

    #[test]
    fn enumerate_gpus_does_not_panic() {
        let _ = enumerate_gpus();
    }

    #[test]
    fn best_backend_falls_back_to_none_without_adapters() {
        // Smoke test only: CI runners often have zero adapters, and that's
        // exactly the path that must not panic.
        let backend = best_backend();
        matches!(
            backend,
            GpuBackend::Metal
                | GpuBackend::Vulkan
                | GpuBackend::Dx12
                | GpuBackend::Gl
                | GpuBackend::BrowserWebGpu
                | GpuBackend::None
        );
    }
}
