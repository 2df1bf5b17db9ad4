//! Graphics pipeline wiring.
use std::{fmt, rc::Rc};

use tracing::{debug, warn};

use crate::{BindingLayout, BindingType, Device, Error, Format, PrimitiveTopology, VertexInputState};

/// Configuration state of a pipeline builder.
///
/// Transitions must happen in declaration order; only a `Ready` pipeline can be drawn with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineState {
    Unconfigured,
    VertexLayoutBound,
    BindingLayoutsBound,
    Ready,
}

/// Attribute locations and binding slots declared by shader code.
///
/// When given to a pipeline builder, `build` checks them against the vertex input state and the
/// binding layouts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    /// `(location, format)` of vertex shader inputs.
    pub vertex_inputs: Vec<(u32, Format)>,
    /// `(set, binding, type)` of resource bindings.
    pub bindings: Vec<(u32, u32, BindingType)>,
}

impl ShaderInterface {
    pub fn new() -> ShaderInterface {
        ShaderInterface::default()
    }

    pub fn input(mut self, location: u32, format: Format) -> Self {
        self.vertex_inputs.push((location, format));
        self
    }

    pub fn binding(mut self, set: u32, binding: u32, ty: BindingType) -> Self {
        self.bindings.push((set, binding, ty));
        self
    }

    fn validate(&self, vertex_input: &VertexInputState, binding_layouts: &[BindingLayout]) -> Result<(), Error> {
        for &(location, format) in self.vertex_inputs.iter() {
            match vertex_input.format_at(location) {
                Some(f) if f == format => {}
                Some(f) => {
                    return Err(Error::LayoutMismatch(format!(
                        "shader input at location {location} is {format}, vertex layout provides {f}"
                    )))
                }
                None => {
                    return Err(Error::LayoutMismatch(format!(
                        "shader input at location {location} has no vertex attribute"
                    )))
                }
            }
        }
        for &(set, binding, ty) in self.bindings.iter() {
            let Some(layout) = binding_layouts.get(set as usize) else {
                return Err(Error::LayoutMismatch(format!("shader uses set {set}, which has no layout")));
            };
            match layout.entry(binding) {
                Some(entry) if entry.ty == ty => {}
                Some(entry) => {
                    return Err(Error::LayoutMismatch(format!(
                        "shader binding ({set}, {binding}) is {ty:?}, layout declares {:?}",
                        entry.ty
                    )))
                }
                None => {
                    return Err(Error::LayoutMismatch(format!(
                        "shader binding ({set}, {binding}) is not declared in the layout"
                    )))
                }
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

struct GraphicsPipelineInner {
    device: Device,
    label: String,
    vertex_input: VertexInputState,
    binding_layouts: Vec<BindingLayout>,
    color_format: Format,
}

/// A fully configured draw configuration.
#[derive(Clone)]
pub struct GraphicsPipeline {
    inner: Rc<GraphicsPipelineInner>,
}

impl GraphicsPipeline {
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::Ready
    }

    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    pub fn vertex_input(&self) -> &VertexInputState {
        &self.inner.vertex_input
    }

    /// Binding layouts, indexed by set index.
    pub fn binding_layouts(&self) -> &[BindingLayout] {
        &self.inner.binding_layouts
    }

    pub fn color_format(&self) -> Format {
        self.inner.color_format
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.inner.vertex_input.topology
    }

    pub fn ptr_eq(&self, other: &GraphicsPipeline) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for GraphicsPipeline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GraphicsPipeline")
            .field("label", &self.inner.label)
            .field("vertex_input", &self.inner.vertex_input)
            .field("binding_layouts", &self.inner.binding_layouts)
            .field("color_format", &self.inner.color_format)
            .finish()
    }
}

/// Builds a `GraphicsPipeline` step by step.
///
/// # Examples
///
/// ```
/// use bindery::*;
///
/// let (device, _queue) = create_device_and_queue(&DeviceCreateInfo::default());
/// let layout = VertexBufferLayout::builder(VertexInputRate::Vertex)
///     .attribute(Format::R32G32B32_SFLOAT)
///     .build();
/// let mut builder = device.graphics_pipeline("triangle");
/// assert!(builder.build().is_err());
/// let pipeline = builder
///     .vertex_input(VertexInputState::new(PrimitiveTopology::TriangleList).buffer(layout))?
///     .binding_layouts(&[])?
///     .build()?;
/// assert_eq!(pipeline.state(), PipelineState::Ready);
/// # Ok::<(), bindery::Error>(())
/// ```
pub struct GraphicsPipelineBuilder {
    device: Device,
    label: String,
    state: PipelineState,
    vertex_input: VertexInputState,
    binding_layouts: Vec<BindingLayout>,
    color_format: Format,
    shader_interface: Option<ShaderInterface>,
}

impl GraphicsPipelineBuilder {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn expect_state(&self, expected: PipelineState) -> Result<(), Error> {
        if self.state != expected {
            warn!(label = self.label.as_str(), ?expected, actual = ?self.state, "invalid pipeline state");
            return Err(Error::InvalidPipelineState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Sets the vertex layout. Moves from `Unconfigured` to `VertexLayoutBound`.
    pub fn vertex_input(&mut self, vertex_input: VertexInputState) -> Result<&mut Self, Error> {
        self.expect_state(PipelineState::Unconfigured)?;
        let limits = self.device.limits();
        if vertex_input.buffers.is_empty() {
            return Err(Error::InvalidArgument("vertex input has no buffer layout".to_string()));
        }
        if let Some(i) = vertex_input.buffers.iter().position(|b| b.attributes.is_empty()) {
            return Err(Error::InvalidArgument(format!("vertex buffer layout {i} has no attributes")));
        }
        if vertex_input.buffers.len() as u32 > limits.max_vertex_buffers {
            return Err(Error::LimitExceeded {
                limit: "max_vertex_buffers",
                value: vertex_input.buffers.len() as u64,
                max: limits.max_vertex_buffers as u64,
            });
        }
        let attribute_count = vertex_input.attribute_count();
        if attribute_count as u32 > limits.max_vertex_attributes {
            return Err(Error::LimitExceeded {
                limit: "max_vertex_attributes",
                value: attribute_count as u64,
                max: limits.max_vertex_attributes as u64,
            });
        }
        self.vertex_input = vertex_input;
        self.state = PipelineState::VertexLayoutBound;
        Ok(self)
    }

    /// Sets the binding layouts; their positions become the set indices.
    /// Moves from `VertexLayoutBound` to `BindingLayoutsBound`.
    pub fn binding_layouts(&mut self, layouts: &[BindingLayout]) -> Result<&mut Self, Error> {
        self.expect_state(PipelineState::VertexLayoutBound)?;
        let max = self.device.limits().max_binding_sets;
        if layouts.len() as u32 > max {
            return Err(Error::LimitExceeded {
                limit: "max_binding_sets",
                value: layouts.len() as u64,
                max: max as u64,
            });
        }
        for layout in layouts {
            self.device.check_owner(layout.device(), layout.label())?;
        }
        self.binding_layouts = layouts.to_vec();
        self.state = PipelineState::BindingLayoutsBound;
        Ok(self)
    }

    /// Sets the format of the color target. Defaults to `R8G8B8A8_UNORM`.
    pub fn color_target(&mut self, format: Format) -> Result<&mut Self, Error> {
        if self.state == PipelineState::Ready {
            return Err(Error::InvalidPipelineState {
                expected: PipelineState::BindingLayoutsBound,
                actual: self.state,
            });
        }
        if !format.is_color_renderable() {
            return Err(Error::InvalidArgument(format!("{format} is not a color target format")));
        }
        self.color_format = format;
        Ok(self)
    }

    /// Declares the shader interface to check the layouts against in `build`.
    pub fn shader_interface(&mut self, interface: ShaderInterface) -> &mut Self {
        self.shader_interface = Some(interface);
        self
    }

    /// Finishes the pipeline. Moves from `BindingLayoutsBound` to `Ready`.
    pub fn build(&mut self) -> Result<GraphicsPipeline, Error> {
        self.expect_state(PipelineState::BindingLayoutsBound)?;
        if let Some(ref interface) = self.shader_interface {
            interface
                .validate(&self.vertex_input, &self.binding_layouts)
                .map_err(|err| {
                    warn!(label = self.label.as_str(), "{err}");
                    err
                })?;
        }
        self.state = PipelineState::Ready;
        debug!(
            label = self.label.as_str(),
            buffers = self.vertex_input.buffers.len(),
            sets = self.binding_layouts.len(),
            "create graphics pipeline"
        );
        Ok(GraphicsPipeline {
            inner: Rc::new(GraphicsPipelineInner {
                device: self.device.clone(),
                label: self.label.clone(),
                vertex_input: self.vertex_input.clone(),
                binding_layouts: self.binding_layouts.clone(),
                color_format: self.color_format,
            }),
        })
    }
}

impl Device {
    /// Starts configuring a graphics pipeline.
    pub fn graphics_pipeline(&self, label: &str) -> GraphicsPipelineBuilder {
        GraphicsPipelineBuilder {
            device: self.clone(),
            label: label.to_string(),
            state: PipelineState::Unconfigured,
            vertex_input: VertexInputState::default(),
            binding_layouts: vec![],
            color_format: Format::R8G8B8A8_UNORM,
            shader_interface: None,
        }
    }
}
