//! GPU search backend using `wgpu`.
//!
//! Generalizes `metal_gpu.rs`'s `gpu_worker_loop` (device/library/pipeline/
//! buffer setup, then a reseed-dispatch-harvest loop) from the Metal-only API
//! to `wgpu`'s uniform abstraction over Metal/Vulkan/DX12, so the same batch
//! driver runs the kernel on any backend `wgpu` can open. The kernel itself
//! (`kernel.wgsl`) also does the pattern match and atomic single-winner claim
//! in-shader, unlike the teacher's host-side filtering loop. The winner
//! publishes its own Base58 address alongside the raw key material, so the
//! host can cross-check the kernel's encoder against an independent one
//! instead of trusting its own output.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use crossbeam_channel::Sender;
use rand::RngCore;
use wgpu::util::DeviceExt;

use crate::cpu_fallback::FoundKey;
use crate::pattern::{PatternConfig, PatternMode};

/// Keys attempted per GPU dispatch, matching the teacher's `GPU_BATCH_SIZE`
/// role at a size tuned for a 256-thread workgroup.
pub const GPU_BATCH_SIZE: u32 = 262_144;

const WORKGROUP_SIZE: u32 = 256;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Uniforms {
    seed_lo: u32,
    seed_hi: u32,
    seed2_lo: u32,
    seed2_hi: u32,
    batch_index: u32,
    batch_size: u32,
    pattern_mode: u32,
    pattern_len: u32,
    case_sensitive: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
    pattern: [[u32; 4]; 11],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SearchResultGpu {
    found: u32,
    winning_id: u32,
    seed: [u32; 8],
    public_key: [u32; 8],
    address: [u32; 44],
    address_len: u32,
}

fn pack_pattern(pattern: &PatternConfig) -> [[u32; 4]; 11] {
    let mut packed = [[0u32; 4]; 11];
    for (i, &b) in pattern.bytes.iter().enumerate() {
        packed[i / 4][i % 4] = b as u32;
    }
    packed
}

fn words_to_bytes(words: &[u32; 8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, w) in words.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&w.to_le_bytes());
    }
    out
}

/// An opened GPU device ready to run search dispatches.
pub struct GpuSearchDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    adapter_name: String,
}

/// No `wgpu` adapter could be found on any backend. Distinguished from other
/// `anyhow::Error`s by downcasting, so the driver can map it to
/// `SearchError::NoGpu` specifically rather than a generic dispatch failure.
#[derive(Debug, thiserror::Error)]
#[error("no wgpu adapter available")]
pub struct NoAdapterError;

impl GpuSearchDevice {
    /// Open the best available `wgpu` adapter across all backends.
    pub fn open() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(NoAdapterError)?;

        let adapter_name = adapter.get_info().name;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vanity-grind-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .context("failed to open wgpu device")?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vanity-kernel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("kernel.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vanity-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vanity-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("vanity-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            adapter_name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Run one batch of `GPU_BATCH_SIZE` candidate keys; returns a match if
    /// the shader's atomic claim landed on one this dispatch.
    fn run_batch(
        &self,
        host_seed: [u64; 2],
        batch_index: u32,
        pattern: &PatternConfig,
    ) -> Option<FoundKey> {
        let uniforms = Uniforms {
            seed_lo: host_seed[0] as u32,
            seed_hi: (host_seed[0] >> 32) as u32,
            seed2_lo: host_seed[1] as u32,
            seed2_hi: (host_seed[1] >> 32) as u32,
            batch_index,
            batch_size: GPU_BATCH_SIZE,
            pattern_mode: match pattern.mode {
                PatternMode::Prefix => 0,
                PatternMode::Suffix => 1,
                PatternMode::Anywhere => 2,
            },
            pattern_len: pattern.len() as u32,
            case_sensitive: pattern.case_sensitive as u32,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
            pattern: pack_pattern(pattern),
        };

        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let zeroed_result = SearchResultGpu::zeroed();
        let result_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("search-result"),
                contents: bytemuck::bytes_of(&zeroed_result),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            });

        let readback_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("search-result-readback"),
            size: std::mem::size_of::<SearchResultGpu>() as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vanity-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: result_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vanity-dispatch"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("vanity-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let num_workgroups = GPU_BATCH_SIZE.div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(num_workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(
            &result_buffer,
            0,
            &readback_buffer,
            0,
            std::mem::size_of::<SearchResultGpu>() as u64,
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = readback_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .expect("map_async callback dropped without firing")
            .expect("failed to map result buffer");

        let data = slice.get_mapped_range();
        let result: SearchResultGpu = bytemuck::pod_read_unaligned(&data);
        drop(data);
        readback_buffer.unmap();

        if result.found == 0 {
            return None;
        }

        let seed = words_to_bytes(&result.seed);
        let public_key = words_to_bytes(&result.public_key);

        let len = (result.address_len as usize).min(result.address.len());
        let address_bytes: Vec<u8> = result.address[..len].iter().map(|&w| w as u8).collect();
        let address =
            String::from_utf8(address_bytes).expect("kernel address is Base58 ASCII");

        let mut private_key = [0u8; 64];
        private_key[..32].copy_from_slice(&seed);
        private_key[32..].copy_from_slice(&public_key);

        Some(FoundKey {
            address,
            private_key,
            public_key,
        })
    }
}

/// Drive GPU dispatches in a loop until `should_stop`, sending matches
/// through `result_sender` and tallying `total_attempts`; mirrors the
/// teacher's `gpu_worker_loop` reseed/dispatch/harvest shape.
pub fn gpu_worker_loop(
    device: &GpuSearchDevice,
    pattern: &PatternConfig,
    result_sender: &Sender<FoundKey>,
    total_attempts: &AtomicU64,
    should_stop: &AtomicBool,
) {
    let mut rng = rand::thread_rng();
    let mut batch_index: u32 = 0;

    loop {
        if should_stop.load(Ordering::Relaxed) {
            break;
        }

        let host_seed = [rng.next_u64(), rng.next_u64()];
        if let Some(found) = device.run_batch(host_seed, batch_index, pattern) {
            if result_sender.send(found).is_err() {
                return;
            }
        }
        batch_index = batch_index.wrapping_add(1);
        total_attempts.fetch_add(GPU_BATCH_SIZE as u64, Ordering::Relaxed);
    }
}
