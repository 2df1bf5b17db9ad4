//! Render command encoders
use std::{mem, ops::Range};

use tracing::{trace, warn};

use crate::{
    command::Command, validate_indices, BindingSet, BufferContents, BufferRange, BufferUsage, CommandEncoder, Error,
    Format, GraphicsPipeline, ImageView, IndexType, Limits, OwnedBufferRange, VertexBufferLayout, VertexInputRate,
};

#[derive(Clone, Debug)]
pub(crate) enum RenderCommand {
    BindPipeline(GraphicsPipeline),
    BindVertexBuffer {
        slot: u32,
        range: OwnedBufferRange,
    },
    BindIndexBuffer {
        range: OwnedBufferRange,
        index_type: IndexType,
    },
    BindBindingSet {
        index: u32,
        set: BindingSet,
    },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
}

/// Work done by one draw call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DrawStats {
    pub(crate) vertices_fetched: u64,
    pub(crate) primitives_assembled: u64,
}

/// Bindings in effect inside a render pass.
///
/// The same state machine checks commands when they are recorded and again when they are
/// executed, against the buffer contents at that time.
pub(crate) struct DrawState {
    limits: Limits,
    target_format: Format,
    pipeline: Option<GraphicsPipeline>,
    vertex_buffers: Vec<Option<OwnedBufferRange>>,
    index_buffer: Option<(OwnedBufferRange, IndexType)>,
    binding_sets: Vec<Option<BindingSet>>,
}

fn check_vertex_layout(slot: u32, declared: &VertexBufferLayout, range: &OwnedBufferRange) -> Result<(), Error> {
    if let Some(layout) = range.buffer.vertex_layout() {
        if layout.stride != declared.stride || layout.attributes != declared.attributes {
            return Err(Error::LayoutMismatch(format!(
                "vertex buffer `{}` bound at slot {slot} has stride {} and attributes {:?}, \
                 the pipeline declares stride {} and attributes {:?}",
                range.buffer.label(),
                layout.stride,
                layout.attributes,
                declared.stride,
                declared.attributes
            )));
        }
    }
    Ok(())
}

fn check_binding_set(index: u32, pipeline: &GraphicsPipeline, set: &BindingSet) -> Result<(), Error> {
    let Some(declared) = pipeline.binding_layouts().get(index as usize) else {
        return Err(Error::LayoutMismatch(format!(
            "pipeline `{}` declares no binding layout at set {index}",
            pipeline.label()
        )));
    };
    if declared != set.layout() {
        return Err(Error::LayoutMismatch(format!(
            "binding set `{}` at set {index} was created for layout `{}`, the pipeline declares `{}`",
            set.label(),
            set.layout().label(),
            declared.label()
        )));
    }
    Ok(())
}

fn check_range(what: &'static str, range: &Range<u32>, limit: Option<u32>) -> Result<(), Error> {
    if range.start > range.end {
        return Err(Error::InvalidArgument(format!("{what} {range:?} is reversed")));
    }
    if let Some(limit) = limit {
        if range.end > limit {
            return Err(Error::OutOfRange {
                what,
                end: range.end as u64,
                limit: limit as u64,
            });
        }
    }
    Ok(())
}

impl DrawState {
    pub(crate) fn new(limits: Limits, target_format: Format) -> DrawState {
        DrawState {
            limits,
            target_format,
            pipeline: None,
            vertex_buffers: vec![],
            index_buffer: None,
            binding_sets: vec![],
        }
    }

    /// Applies a command. Returns the work done if the command is a draw.
    pub(crate) fn apply(&mut self, command: &RenderCommand) -> Result<Option<DrawStats>, Error> {
        match command {
            RenderCommand::BindPipeline(pipeline) => self.bind_pipeline(pipeline)?,
            RenderCommand::BindVertexBuffer { slot, range } => self.bind_vertex_buffer(*slot, range)?,
            RenderCommand::BindIndexBuffer { range, index_type } => self.bind_index_buffer(range, *index_type)?,
            RenderCommand::BindBindingSet { index, set } => self.bind_binding_set(*index, set)?,
            RenderCommand::Draw { vertices, instances } => return self.draw(vertices, instances).map(Some),
            RenderCommand::DrawIndexed {
                indices,
                base_vertex,
                instances,
            } => return self.draw_indexed(indices, *base_vertex, instances).map(Some),
        }
        Ok(None)
    }

    fn bind_pipeline(&mut self, pipeline: &GraphicsPipeline) -> Result<(), Error> {
        if pipeline.color_format() != self.target_format {
            return Err(Error::LayoutMismatch(format!(
                "pipeline `{}` renders to {}, the render target is {}",
                pipeline.label(),
                pipeline.color_format(),
                self.target_format
            )));
        }
        self.pipeline = Some(pipeline.clone());
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, slot: u32, range: &OwnedBufferRange) -> Result<(), Error> {
        range.buffer.check_usage(BufferUsage::VERTEX_BUFFER)?;
        range.as_range().check()?;
        if slot >= self.limits.max_vertex_buffers {
            return Err(Error::LimitExceeded {
                limit: "max_vertex_buffers",
                value: slot as u64 + 1,
                max: self.limits.max_vertex_buffers as u64,
            });
        }
        if let Some(ref pipeline) = self.pipeline {
            let Some(declared) = pipeline.vertex_input().buffers.get(slot as usize) else {
                return Err(Error::LayoutMismatch(format!(
                    "pipeline `{}` declares no vertex buffer at slot {slot}",
                    pipeline.label()
                )));
            };
            check_vertex_layout(slot, declared, range)?;
        }
        let slot = slot as usize;
        if self.vertex_buffers.len() <= slot {
            self.vertex_buffers.resize(slot + 1, None);
        }
        self.vertex_buffers[slot] = Some(range.clone());
        Ok(())
    }

    fn bind_index_buffer(&mut self, range: &OwnedBufferRange, index_type: IndexType) -> Result<(), Error> {
        range.buffer.check_usage(BufferUsage::INDEX_BUFFER)?;
        range.as_range().check()?;
        if let BufferContents::Indices { index_type: t, .. } = range.buffer.contents() {
            if *t != index_type {
                return Err(Error::LayoutMismatch(format!(
                    "index buffer `{}` holds {t:?} indices, bound as {index_type:?}",
                    range.buffer.label()
                )));
            }
        }
        if range.offset % index_type.byte_size() != 0 {
            return Err(Error::InvalidArgument(format!(
                "index buffer offset {} is not aligned to the index size",
                range.offset
            )));
        }
        self.index_buffer = Some((range.clone(), index_type));
        Ok(())
    }

    fn bind_binding_set(&mut self, index: u32, set: &BindingSet) -> Result<(), Error> {
        if index >= self.limits.max_binding_sets {
            return Err(Error::LimitExceeded {
                limit: "max_binding_sets",
                value: index as u64 + 1,
                max: self.limits.max_binding_sets as u64,
            });
        }
        if let Some(ref pipeline) = self.pipeline {
            check_binding_set(index, pipeline, set)?;
        }
        let index = index as usize;
        if self.binding_sets.len() <= index {
            self.binding_sets.resize(index + 1, None);
        }
        self.binding_sets[index] = Some(set.clone());
        Ok(())
    }

    /// Checks the bindings against the pipeline. Returns the pipeline and the number of
    /// elements available in per-vertex and per-instance buffers.
    fn validate_bindings(&self) -> Result<(&GraphicsPipeline, Option<u32>, Option<u32>), Error> {
        let Some(ref pipeline) = self.pipeline else {
            warn!("draw without a ready pipeline");
            return Err(Error::PipelineNotReady);
        };

        let mut vertex_limit: Option<u32> = None;
        let mut instance_limit: Option<u32> = None;
        for (slot, declared) in pipeline.vertex_input().buffers.iter().enumerate() {
            let Some(Some(range)) = self.vertex_buffers.get(slot) else {
                return Err(Error::LayoutMismatch(format!("vertex buffer slot {slot} is not bound")));
            };
            check_vertex_layout(slot as u32, declared, range)?;
            let count = (range.size / declared.stride as u64).min(u32::MAX as u64) as u32;
            let limit = match declared.input_rate {
                VertexInputRate::Vertex => &mut vertex_limit,
                VertexInputRate::Instance => &mut instance_limit,
            };
            *limit = Some(limit.map_or(count, |l| l.min(count)));
        }

        for index in 0..pipeline.binding_layouts().len() {
            let Some(Some(set)) = self.binding_sets.get(index) else {
                return Err(Error::LayoutMismatch(format!("binding set {index} is not bound")));
            };
            check_binding_set(index as u32, pipeline, set)?;
        }

        Ok((pipeline, vertex_limit, instance_limit))
    }

    fn draw(&self, vertices: &Range<u32>, instances: &Range<u32>) -> Result<DrawStats, Error> {
        let (pipeline, vertex_limit, instance_limit) = self.validate_bindings()?;
        check_range("vertex range", vertices, vertex_limit)?;
        check_range("instance range", instances, instance_limit)?;
        let topology = pipeline.topology();
        let count = vertices.len() as u32;
        if !topology.is_valid_vertex_count(count) {
            return Err(Error::IndexCountMismatch {
                count,
                topology: format!("{topology:?}"),
            });
        }
        let instance_count = instances.len() as u64;
        Ok(DrawStats {
            vertices_fetched: count as u64 * instance_count,
            primitives_assembled: topology.primitive_count(count) as u64 * instance_count,
        })
    }

    fn draw_indexed(&self, indices: &Range<u32>, base_vertex: i32, instances: &Range<u32>) -> Result<DrawStats, Error> {
        let (pipeline, vertex_limit, instance_limit) = self.validate_bindings()?;
        let Some((ref range, index_type)) = self.index_buffer else {
            return Err(Error::LayoutMismatch("no index buffer bound".to_string()));
        };
        let index_size = index_type.byte_size();
        check_range("index range", indices, Some((range.size / index_size) as u32))?;
        check_range("instance range", instances, instance_limit)?;

        let bytes = range.buffer.device().buffer_bytes(
            &range.buffer,
            range.offset + indices.start as u64 * index_size,
            indices.len() as u64 * index_size,
        );
        let values = bytes.chunks_exact(index_size as usize).map(|b| match index_type {
            IndexType::U16 => u16::from_ne_bytes([b[0], b[1]]) as u32,
            IndexType::U32 => u32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
        });
        let topology = pipeline.topology();
        let count = validate_indices(values, topology, base_vertex, vertex_limit.unwrap_or(u32::MAX))?;

        let instance_count = instances.len() as u64;
        Ok(DrawStats {
            vertices_fetched: count as u64 * instance_count,
            primitives_assembled: topology.primitive_count(count) as u64 * instance_count,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Records draw commands into a render pass.
///
/// Each command is checked against the current bindings when it is recorded; a rejected
/// command is not recorded. The pass is added to the parent encoder when this encoder is ended
/// or dropped.
pub struct RenderEncoder<'a> {
    encoder: &'a mut CommandEncoder,
    target: ImageView,
    clear: Option<[f32; 4]>,
    commands: Vec<RenderCommand>,
    state: DrawState,
}

impl<'a> RenderEncoder<'a> {
    pub(super) fn new(encoder: &'a mut CommandEncoder, target: ImageView, clear: Option<[f32; 4]>) -> Self {
        let state = DrawState::new(*encoder.device().limits(), target.format());
        RenderEncoder {
            encoder,
            target,
            clear,
            commands: vec![],
            state,
        }
    }

    fn record(&mut self, command: RenderCommand) -> Result<(), Error> {
        if let Err(err) = self.state.apply(&command) {
            warn!(render_target = self.target.image().label(), ?command, "{err}");
            return Err(err);
        }
        trace!(?command, "record");
        self.commands.push(command);
        Ok(())
    }

    pub fn target(&self) -> &ImageView {
        &self.target
    }

    pub fn bind_pipeline(&mut self, pipeline: &GraphicsPipeline) -> Result<(), Error> {
        self.encoder
            .device()
            .check_owner(pipeline.device(), pipeline.label())?;
        self.record(RenderCommand::BindPipeline(pipeline.clone()))
    }

    /// Binds a vertex buffer at the given slot.
    pub fn bind_vertex_buffer(&mut self, slot: u32, range: BufferRange) -> Result<(), Error> {
        self.encoder.check_buffer(range.buffer)?;
        self.record(RenderCommand::BindVertexBuffer {
            slot,
            range: range.to_owned(),
        })
    }

    pub fn bind_index_buffer(&mut self, range: BufferRange, index_type: IndexType) -> Result<(), Error> {
        self.encoder.check_buffer(range.buffer)?;
        self.record(RenderCommand::BindIndexBuffer {
            range: range.to_owned(),
            index_type,
        })
    }

    /// Binds a binding set at the given set index.
    pub fn bind_binding_set(&mut self, index: u32, set: &BindingSet) -> Result<(), Error> {
        self.encoder
            .device()
            .check_owner(set.layout().device(), set.label())?;
        self.record(RenderCommand::BindBindingSet {
            index,
            set: set.clone(),
        })
    }

    pub fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) -> Result<(), Error> {
        self.record(RenderCommand::Draw { vertices, instances })
    }

    /// Draws `indices` from the bound index buffer. `base_vertex` is added to each index.
    pub fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) -> Result<(), Error> {
        self.record(RenderCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        })
    }

    /// Ends the render pass.
    pub fn end(self) {}
}

impl<'a> Drop for RenderEncoder<'a> {
    fn drop(&mut self) {
        let commands = mem::take(&mut self.commands);
        self.encoder.push(Command::RenderPass {
            target: self.target.clone(),
            clear: self.clear,
            commands,
        });
    }
}
