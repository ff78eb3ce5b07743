#[cfg(feature = "gpu")]
pub use device::{adapter_name, AcceleratedEngine};
#[cfg(not(feature = "gpu"))]
pub use disabled::{adapter_name, AcceleratedEngine};

#[cfg(feature = "gpu")]
mod device {
    use crate::engine::{check_engine_dimensions, check_step_shapes, Backend, StepEngine};
    use crate::{GridState, LifeError, Result};
    use wgpu::util::DeviceExt;

    const WORKGROUP_SIDE: u32 = 8;

    /// Runs the stencil as a compute shader over two ping-pong storage buffers.
    ///
    /// The field crosses the host/device boundary only in `upload` and `download`.
    /// Dispatches are queued asynchronously; `synchronize` (and `download`, which
    /// calls it) is the only point where the host waits for them. All device objects
    /// are owned here and released when the engine is dropped.
    pub struct AcceleratedEngine {
        host: Vec<u32>,
        width: usize,
        height: usize,
        workgroups: [u32; 2],
        device: wgpu::Device,
        queue: wgpu::Queue,
        idx_active: usize,
        storage_buffers: [wgpu::Buffer; 2],
        bind_groups: [wgpu::BindGroup; 2],
        staging_buffer: wgpu::Buffer,
        pipeline: wgpu::ComputePipeline,
    }

    fn unavailable(reason: impl Into<String>) -> LifeError {
        LifeError::unavailable(Backend::Accelerated, reason)
    }

    fn request_adapter() -> Option<wgpu::Adapter> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
    }

    /// Name of the adapter the engine would run on, if any.
    pub fn adapter_name() -> Option<String> {
        request_adapter().map(|adapter| adapter.get_info().name)
    }

    impl AcceleratedEngine {
        pub fn new(width: usize, height: usize) -> Result<Self> {
            check_engine_dimensions(width, height)?;
            let adapter =
                request_adapter().ok_or_else(|| unavailable("no compatible adapter found"))?;
            let info = adapter.get_info();
            if !adapter
                .get_downlevel_capabilities()
                .flags
                .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
            {
                return Err(unavailable(format!(
                    "adapter `{}` cannot run compute shaders",
                    info.name
                )));
            }

            let limits = adapter.limits();
            let buffer_size = width
                .checked_mul(height)
                .and_then(|cells| cells.checked_mul(std::mem::size_of::<u32>()))
                .map(|bytes| bytes as u64)
                .filter(|&bytes| {
                    bytes <= limits.max_storage_buffer_binding_size as u64
                        && bytes <= limits.max_buffer_size
                })
                .ok_or_else(|| {
                    unavailable(format!(
                        "a {}x{} field does not fit into a storage buffer of `{}`",
                        width, height, info.name
                    ))
                })?;
            let workgroups = [width, height].map(|side| side.div_ceil(WORKGROUP_SIDE as usize));
            if workgroups
                .iter()
                .any(|&n| n > limits.max_compute_workgroups_per_dimension as usize)
            {
                return Err(unavailable(format!(
                    "a {}x{} field needs more workgroups than `{}` dispatches",
                    width, height, info.name
                )));
            }
            let workgroups = workgroups.map(|n| n as u32);

            let (device, queue) = pollster::block_on(adapter.request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("gol_bench"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            ))
            .map_err(|e| unavailable(e.to_string()))?;

            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let uniform_dims = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("life_dimensions"),
                contents: bytemuck::cast_slice(&[width as u32, height as u32, 0, 0]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let buffer_desc = wgpu::BufferDescriptor {
                label: Some("life_cells"),
                size: buffer_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            };
            let storage_buffers = [0; 2].map(|_| device.create_buffer(&buffer_desc));
            let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("life_staging"),
                size: buffer_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("life_layout"),
                    entries: &[
                        (0, wgpu::BufferBindingType::Uniform),
                        (1, wgpu::BufferBindingType::Storage { read_only: true }),
                        (2, wgpu::BufferBindingType::Storage { read_only: false }),
                    ]
                    .map(|(binding, ty)| wgpu::BindGroupLayoutEntry {
                        binding,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }),
                });
            // bind group `i` reads buffer `i` and writes the other one
            let bind_groups = [(0, 1), (1, 0)].map(|(idx_src, idx_dst)| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("life_bind_group"),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_dims.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: storage_buffers[idx_src].as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: storage_buffers[idx_dst].as_entire_binding(),
                        },
                    ],
                })
            });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("life_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("life_shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("life.wgsl").into()),
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("life_pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });
            if let Some(err) = pollster::block_on(device.pop_error_scope()) {
                return Err(unavailable(err.to_string()));
            }

            tracing::debug!(adapter = %info.name, backend = ?info.backend, width, height, "acquired device");
            Ok(Self {
                host: Vec::with_capacity(width * height),
                width,
                height,
                workgroups,
                device,
                queue,
                idx_active: 0,
                storage_buffers,
                bind_groups,
                staging_buffer,
                pipeline,
            })
        }

        fn pop_error_scope(&self) -> Result<()> {
            match pollster::block_on(self.device.pop_error_scope()) {
                Some(err) => Err(LifeError::Synchronization(err.to_string())),
                None => Ok(()),
            }
        }

        /// Host -> device copy of `grid` into the active buffer.
        fn upload(&mut self, grid: &GridState) -> Result<()> {
            self.host.clear();
            self.host.extend(grid.cells().iter().map(|&c| c as u32));
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            self.queue.write_buffer(
                &self.storage_buffers[self.idx_active],
                0,
                bytemuck::cast_slice(&self.host),
            );
            self.pop_error_scope()
        }

        /// Queues `steps` generations without waiting for them.
        fn dispatch(&mut self, steps: usize) -> Result<()> {
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("life_steps"),
                });
            for _ in 0..steps {
                {
                    let mut compute_pass =
                        encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                            label: Some("life_step"),
                            timestamp_writes: None,
                        });
                    compute_pass.set_pipeline(&self.pipeline);
                    compute_pass.set_bind_group(0, &self.bind_groups[self.idx_active], &[]);
                    compute_pass.dispatch_workgroups(self.workgroups[0], self.workgroups[1], 1);
                }
                self.idx_active = 1 - self.idx_active;
            }
            self.queue.submit(Some(encoder.finish()));
            self.pop_error_scope()
        }

        /// Device -> host copy of the active buffer into `dst`.
        fn download(&mut self, dst: &mut GridState) -> Result<()> {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("life_readback"),
                });
            encoder.copy_buffer_to_buffer(
                &self.storage_buffers[self.idx_active],
                0,
                &self.staging_buffer,
                0,
                self.staging_buffer.size(),
            );
            self.queue.submit(Some(encoder.finish()));
            self.synchronize()?;

            let buffer_slice = self.staging_buffer.slice(..);
            let (sender, receiver) = flume::bounded(1);
            buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
                let _ = sender.send(r);
            });
            self.device.poll(wgpu::Maintain::Wait);
            match receiver.recv() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(LifeError::Synchronization(e.to_string())),
                Err(_) => {
                    return Err(LifeError::Synchronization(
                        "staging buffer was never mapped".to_string(),
                    ))
                }
            }
            {
                let view = buffer_slice.get_mapped_range();
                let words: &[u32] = bytemuck::cast_slice(&view);
                for (cell, &word) in dst.cells_mut().iter_mut().zip(words) {
                    *cell = (word != 0) as u8;
                }
            }
            self.staging_buffer.unmap();
            Ok(())
        }
    }

    impl StepEngine for AcceleratedEngine {
        fn backend(&self) -> Backend {
            Backend::Accelerated
        }

        fn dimensions(&self) -> (usize, usize) {
            (self.width, self.height)
        }

        fn step_into(&mut self, src: &GridState, dst: &mut GridState) -> Result<()> {
            check_step_shapes(self.dimensions(), src, dst)?;
            self.upload(src)?;
            self.dispatch(1)?;
            self.download(dst)?;
            dst.set_generation(src.generation() + 1);
            Ok(())
        }

        fn advance(&mut self, grid: GridState, steps: usize) -> Result<GridState> {
            check_step_shapes(self.dimensions(), &grid, &grid)?;
            if steps == 0 {
                return Ok(grid);
            }
            let mut result = grid;
            self.upload(&result)?;
            self.dispatch(steps)?;
            self.download(&mut result)?;
            result.set_generation(result.generation() + steps as u64);
            Ok(result)
        }

        fn synchronize(&mut self) -> Result<()> {
            let (sender, receiver) = flume::bounded(1);
            self.queue.on_submitted_work_done(move || {
                let _ = sender.send(());
            });
            self.device.poll(wgpu::Maintain::Wait);
            receiver.recv().map_err(|_| {
                LifeError::Synchronization("device lost before queued work completed".to_string())
            })
        }
    }
}

#[cfg(not(feature = "gpu"))]
mod disabled {
    use crate::engine::{check_engine_dimensions, Backend, StepEngine};
    use crate::{GridState, LifeError, Result};

    /// Placeholder for builds without the `gpu` feature; it can never be constructed.
    pub enum AcceleratedEngine {}

    impl AcceleratedEngine {
        pub fn new(width: usize, height: usize) -> Result<Self> {
            check_engine_dimensions(width, height)?;
            Err(LifeError::unavailable(
                Backend::Accelerated,
                "built without the `gpu` feature",
            ))
        }
    }

    pub fn adapter_name() -> Option<String> {
        None
    }

    impl StepEngine for AcceleratedEngine {
        fn backend(&self) -> Backend {
            match *self {}
        }

        fn dimensions(&self) -> (usize, usize) {
            match *self {}
        }

        fn step_into(&mut self, _src: &GridState, _dst: &mut GridState) -> Result<()> {
            match *self {}
        }
    }
}
