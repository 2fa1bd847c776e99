//! wgpu compute backend
//!
//! Six storage buffers (three logical buffers, two halves each) plus one
//! uniform. Both bind groups are built up front: bind group `p` reads slot
//! `p` and writes the other one, so a dispatch only has to pick by parity.

use std::sync::mpsc;

use bytemuck::Pod;
use swarm_physics::{
    DoubleBuffer, GridLayout, ParticleBuffers, ParticleRecord, SimulationConfig, config_seed,
};
use wgpu::util::DeviceExt;

use crate::{ComputeBackend, SimParams, SimulationError, StepInputs};

pub const WORKGROUP_SIZE: u32 = 8;

const RECORD_SIZE: u64 = 16;

/// One half of the particle state on the device
pub struct GpuBufferSet {
    pub transforms: wgpu::Buffer,
    pub colors: wgpu::Buffer,
    pub properties: wgpu::Buffer,
}

impl GpuBufferSet {
    fn create(device: &wgpu::Device, label: &str, host: &ParticleBuffers) -> Self {
        let usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;

        let transforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Transform Buffer")),
            contents: bytemuck::cast_slice(&host.transforms),
            usage,
        });
        let colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Color Buffer")),
            contents: bytemuck::cast_slice(&host.colors),
            usage,
        });
        let properties = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Properties Buffer")),
            contents: bytemuck::cast_slice(&host.properties),
            usage,
        });

        Self {
            transforms,
            colors,
            properties,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, host: &ParticleBuffers) {
        queue.write_buffer(&self.transforms, 0, bytemuck::cast_slice(&host.transforms));
        queue.write_buffer(&self.colors, 0, bytemuck::cast_slice(&host.colors));
        queue.write_buffer(&self.properties, 0, bytemuck::cast_slice(&host.properties));
    }
}

/// Request a device able to hold the largest grid the adapter allows
pub async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), SimulationError> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Swarm Device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok((device, queue))
}

/// Device without a surface, for tests and benchmarks
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue), SimulationError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await?;
    log::info!("Using headless adapter: {}", adapter.get_info().name);
    request_device(&adapter).await
}

pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout: GridLayout,

    buffers: DoubleBuffer<GpuBufferSet>,
    params_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,

    pipeline: wgpu::ComputePipeline,
    // Indexed by parity
    bind_groups: [wgpu::BindGroup; 2],
}

impl GpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        layout: GridLayout,
        seed: impl Fn(u32) -> Option<ParticleRecord>,
    ) -> Result<Self, SimulationError> {
        log::info!("Initializing GpuBackend...");
        check_limits(&device.limits(), &layout)?;
        let host = ParticleBuffers::seeded(&layout, seed)?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let even = GpuBufferSet::create(&device, "Even", &host);
        let odd = GpuBufferSet::create(&device, "Odd", &host);

        let params = SimParams::new(&layout, &Default::default(), &Default::default());
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size: layout.capacity() as u64 * RECORD_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::OutOfMemory(error.to_string()));
        }
        log::info!("Buffers created");

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Swarm Step Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/swarm_step.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Swarm Step Bind Group Layout"),
            entries: &[
                layout_entry(0, wgpu::BufferBindingType::Uniform),
                layout_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(2, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(3, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(4, wgpu::BufferBindingType::Storage { read_only: false }),
                layout_entry(5, wgpu::BufferBindingType::Storage { read_only: false }),
                layout_entry(6, wgpu::BufferBindingType::Storage { read_only: false }),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Swarm Step Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Swarm Step Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let bind_groups = [
            create_step_bind_group(&device, &bind_group_layout, &params_buffer, &even, &odd),
            create_step_bind_group(&device, &bind_group_layout, &params_buffer, &odd, &even),
        ];

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::Pipeline(error.to_string()));
        }
        log::info!("Pipeline created");

        Ok(Self {
            device,
            queue,
            layout,
            buffers: DoubleBuffer::new(even, odd),
            params_buffer,
            staging_buffer,
            pipeline,
            bind_groups,
        })
    }

    /// Headless backend seeded from `config`
    pub fn request(config: &SimulationConfig) -> Result<Self, SimulationError> {
        let (device, queue) = pollster::block_on(request_headless_device())?;
        Self::new(
            device,
            queue,
            GridLayout::new(config.particle_count),
            config_seed(config),
        )
    }

    /// The half the renderer should draw
    pub fn current(&self) -> &GpuBufferSet {
        self.buffers.current()
    }

    /// The half the next dispatch will write
    pub fn next(&self) -> &GpuBufferSet {
        self.buffers.next()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn read_buffer<T: Pod>(&self, source: &wgpu::Buffer) -> Result<Vec<T>, SimulationError> {
        let size = source.size();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &self.staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging_buffer.slice(..size);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| SimulationError::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| SimulationError::Readback(e.to_string()))?
            .map_err(|e| SimulationError::Readback(e.to_string()))?;

        let values = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice(&data).to_vec()
        };
        self.staging_buffer.unmap();
        Ok(values)
    }
}

impl ComputeBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn layout(&self) -> GridLayout {
        self.layout
    }

    fn dispatch(&mut self, inputs: &StepInputs) -> Result<(), SimulationError> {
        let params = SimParams::new(&self.layout, &inputs.config, &inputs.pointer);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Swarm Step Encoder"),
            });

        let workgroups = self.layout.workgroups(WORKGROUP_SIZE);
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Swarm Step Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_groups[self.buffers.parity().index()], &[]);
            compute_pass.dispatch_workgroups(workgroups, workgroups, 1);
        }

        // Later submissions on this queue observe every write of the pass
        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(SimulationError::Dispatch(error.to_string()));
        }
        Ok(())
    }

    fn swap(&mut self) {
        self.buffers.swap();
    }

    fn reseed(&mut self, seed: &dyn Fn(u32) -> Option<ParticleRecord>) -> Result<(), SimulationError> {
        let host = ParticleBuffers::seeded(&self.layout, seed)?;
        let queue = &self.queue;
        self.buffers.for_each_mut(|set| set.upload(queue, &host));
        Ok(())
    }

    fn snapshot(&self) -> Result<ParticleBuffers, SimulationError> {
        let current = self.buffers.current();
        Ok(ParticleBuffers {
            transforms: self.read_buffer(&current.transforms)?,
            colors: self.read_buffer(&current.colors)?,
            properties: self.read_buffer(&current.properties)?,
        })
    }
}

/// Every state buffer holds one 16-byte record per grid cell and must fit a single binding
fn check_limits(limits: &wgpu::Limits, layout: &GridLayout) -> Result<(), SimulationError> {
    let bytes = layout.capacity() as u64 * RECORD_SIZE;
    let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    if bytes > limit {
        return Err(SimulationError::Allocation {
            side: layout.side(),
            bytes,
            limit,
        });
    }
    Ok(())
}

fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_step_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    params: &wgpu::Buffer,
    read: &GpuBufferSet,
    write: &GpuBufferSet,
) -> wgpu::BindGroup {
    let buffers = [
        params,
        &read.transforms,
        &read.colors,
        &read.properties,
        &write.transforms,
        &write.colors,
        &write.properties,
    ];
    let entries: Vec<wgpu::BindGroupEntry> = buffers
        .iter()
        .enumerate()
        .map(|(binding, buffer)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: buffer.as_entire_binding(),
        })
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Swarm Step Bind Group"),
        layout,
        entries: &entries,
    })
}
