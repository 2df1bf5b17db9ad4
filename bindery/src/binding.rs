//! Binding layouts and binding sets.
use std::{fmt, rc::Rc};

use tracing::{debug, warn};

use crate::{
    vk, Arguments, BindingLayoutId, Buffer, BufferRange, BufferUsage, Device, Error, ImageUsage, ImageView,
    OwnedBufferRange, Sampler, ShaderStages, StaticArguments,
};

/// Kind of resource expected at a binding slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingType {
    SampledTexture,
    Sampler,
    UniformBuffer,
    StorageBuffer { read_only: bool },
}

impl BindingType {
    pub const fn to_vk_descriptor_type(self) -> vk::DescriptorType {
        match self {
            Self::SampledTexture => vk::DescriptorType::SAMPLED_IMAGE,
            Self::Sampler => vk::DescriptorType::SAMPLER,
            Self::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            Self::StorageBuffer { .. } => vk::DescriptorType::STORAGE_BUFFER,
        }
    }
}

impl From<BindingType> for vk::DescriptorType {
    fn from(ty: BindingType) -> Self {
        ty.to_vk_descriptor_type()
    }
}

/// Declaration of one slot of a binding layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStages,
    pub ty: BindingType,
}

impl BindingLayoutEntry {
    pub fn to_vk(&self) -> vk::DescriptorSetLayoutBinding {
        vk::DescriptorSetLayoutBinding {
            binding: self.binding,
            descriptor_type: self.ty.to_vk_descriptor_type(),
            descriptor_count: 1,
            stage_flags: self.visibility.to_vk_shader_stage_flags(),
            ..Default::default()
        }
    }
}

struct BindingLayoutInner {
    device: Device,
    id: BindingLayoutId,
    label: String,
    entries: Vec<BindingLayoutEntry>,
}

impl Drop for BindingLayoutInner {
    fn drop(&mut self) {
        debug!(label = self.label.as_str(), "destroy binding layout");
        self.device.inner.binding_layouts.borrow_mut().remove(self.id);
    }
}

/// Declared shape of the resources a shader expects at one set index.
///
/// Layouts are compared by identity: two layouts created from the same entries are still
/// distinct.
#[derive(Clone)]
pub struct BindingLayout {
    inner: Rc<BindingLayoutInner>,
}

impl BindingLayout {
    pub fn id(&self) -> BindingLayoutId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the device on which the layout was created.
    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    /// Slot declarations, sorted by binding index.
    pub fn entries(&self) -> &[BindingLayoutEntry] {
        &self.inner.entries
    }

    pub fn entry(&self, binding: u32) -> Option<&BindingLayoutEntry> {
        self.inner
            .entries
            .binary_search_by_key(&binding, |e| e.binding)
            .ok()
            .map(|i| &self.inner.entries[i])
    }
}

impl PartialEq for BindingLayout {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for BindingLayout {}

impl fmt::Debug for BindingLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BindingLayout")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("entries", &self.inner.entries)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A resource assigned to a slot.
#[derive(Copy, Clone, Debug)]
pub enum BindingResource<'a> {
    TextureView(&'a ImageView),
    Sampler(&'a Sampler),
    Buffer(BufferRange<'a>),
}

impl<'a> BindingResource<'a> {
    fn kind_name(&self) -> &'static str {
        match self {
            BindingResource::TextureView(_) => "texture view",
            BindingResource::Sampler(_) => "sampler",
            BindingResource::Buffer(_) => "buffer",
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct BindingSetEntry<'a> {
    pub binding: u32,
    pub resource: BindingResource<'a>,
}

/// A resource held by a binding set.
#[derive(Clone, Debug)]
pub enum BoundResource {
    TextureView(ImageView),
    Sampler(Sampler),
    Buffer(OwnedBufferRange),
}

struct BindingSetInner {
    label: String,
    layout: BindingLayout,
    resources: Vec<(u32, BoundResource)>,
}

/// Concrete resources assigned to every slot of a binding layout.
///
/// Keeps its layout and its resources alive.
#[derive(Clone)]
pub struct BindingSet {
    inner: Rc<BindingSetInner>,
}

impl BindingSet {
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn layout(&self) -> &BindingLayout {
        &self.inner.layout
    }

    pub fn resource(&self, binding: u32) -> Option<&BoundResource> {
        self.inner.resources.iter().find(|(b, _)| *b == binding).map(|(_, r)| r)
    }

    pub fn resources(&self) -> impl Iterator<Item = (u32, &BoundResource)> + '_ {
        self.inner.resources.iter().map(|(b, r)| (*b, r))
    }
}

impl fmt::Debug for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BindingSet")
            .field("label", &self.inner.label)
            .field("layout", &self.inner.layout.id())
            .finish()
    }
}

fn mismatch(binding: u32, reason: impl Into<String>) -> Error {
    let reason = reason.into();
    warn!(binding, reason = reason.as_str(), "binding mismatch");
    Error::BindingMismatch { binding, reason }
}

/// Fails if `resource` was created on another device than `device`.
fn check_resource_owner(device: &Device, resource: &BindingResource) -> Result<(), Error> {
    match *resource {
        BindingResource::TextureView(view) => device.check_owner(view.image().device(), view.image().label()),
        BindingResource::Sampler(sampler) => {
            if sampler.device().ptr_eq(device) {
                Ok(())
            } else {
                Err(Error::ForeignResource {
                    resource: format!("{:?}", sampler.id()),
                    device: device.label().to_string(),
                })
            }
        }
        BindingResource::Buffer(range) => device.check_owner(range.buffer.device(), range.buffer.label()),
    }
}

fn bind_resource(declared: &BindingLayoutEntry, resource: &BindingResource) -> Result<BoundResource, Error> {
    match (declared.ty, *resource) {
        (BindingType::SampledTexture, BindingResource::TextureView(view)) => {
            view.image().check_usage(ImageUsage::SAMPLED)?;
            Ok(BoundResource::TextureView(view.clone()))
        }
        (BindingType::Sampler, BindingResource::Sampler(sampler)) => Ok(BoundResource::Sampler(sampler.clone())),
        (BindingType::UniformBuffer, BindingResource::Buffer(range)) => {
            range.check()?;
            range.buffer.check_usage(BufferUsage::UNIFORM_BUFFER)?;
            Ok(BoundResource::Buffer(range.to_owned()))
        }
        (BindingType::StorageBuffer { .. }, BindingResource::Buffer(range)) => {
            range.check()?;
            range.buffer.check_usage(BufferUsage::STORAGE_BUFFER)?;
            Ok(BoundResource::Buffer(range.to_owned()))
        }
        (ty, resource) => Err(mismatch(
            declared.binding,
            format!("expected {ty:?}, got a {}", resource.kind_name()),
        )),
    }
}

impl Device {
    /// Creates a binding layout from slot declarations.
    ///
    /// Binding indices must be unique within the layout. Entries can be given in any order.
    pub fn create_binding_layout(&self, label: &str, entries: &[BindingLayoutEntry]) -> Result<BindingLayout, Error> {
        let max = self.limits().max_bindings_per_layout;
        if entries.len() as u32 > max {
            return Err(Error::LimitExceeded {
                limit: "max_bindings_per_layout",
                value: entries.len() as u64,
                max: max as u64,
            });
        }
        let mut entries = entries.to_vec();
        entries.sort_by_key(|e| e.binding);
        for pair in entries.windows(2) {
            if pair[0].binding == pair[1].binding {
                warn!(label, binding = pair[0].binding, "duplicate binding index");
                return Err(Error::DuplicateBinding(pair[0].binding));
            }
        }

        let id = self.inner.binding_layouts.borrow_mut().insert(label.to_string());
        debug!(?id, label, ?entries, "create binding layout");
        Ok(BindingLayout {
            inner: Rc::new(BindingLayoutInner {
                device: self.clone(),
                id,
                label: label.to_string(),
                entries,
            }),
        })
    }

    /// Creates a binding set, assigning one resource to each slot of `layout`.
    ///
    /// Every declared slot must be assigned exactly once, with a resource of the declared kind.
    pub fn create_binding_set(
        &self,
        label: &str,
        layout: &BindingLayout,
        entries: &[BindingSetEntry],
    ) -> Result<BindingSet, Error> {
        self.check_owner(layout.device(), layout.label())?;
        let mut resources: Vec<(u32, BoundResource)> = Vec::with_capacity(entries.len());
        for entry in entries {
            check_resource_owner(self, &entry.resource)?;
            let Some(declared) = layout.entry(entry.binding) else {
                return Err(mismatch(entry.binding, "slot is not declared in the layout"));
            };
            if resources.iter().any(|(b, _)| *b == entry.binding) {
                return Err(mismatch(entry.binding, "slot is assigned more than once"));
            }
            resources.push((entry.binding, bind_resource(declared, &entry.resource)?));
        }
        for declared in layout.entries() {
            if !resources.iter().any(|(b, _)| *b == declared.binding) {
                return Err(mismatch(declared.binding, "no resource assigned to slot"));
            }
        }
        resources.sort_by_key(|(b, _)| *b);

        debug!(label, layout = ?layout.id(), "create binding set");
        Ok(BindingSet {
            inner: Rc::new(BindingSetInner {
                label: label.to_string(),
                layout: layout.clone(),
                resources,
            }),
        })
    }

    /// Creates the binding layout declared by `#[derive(Arguments)]` on `A`.
    pub fn create_binding_layout_for<A: StaticArguments>(&self, label: &str) -> Result<BindingLayout, Error> {
        self.create_binding_layout(label, A::LAYOUT)
    }

    /// Creates a binding set from the fields of an `Arguments` struct.
    pub fn create_binding_set_for<A: Arguments>(
        &self,
        label: &str,
        layout: &BindingLayout,
        arguments: &A,
    ) -> Result<BindingSet, Error> {
        self.create_binding_set(label, layout, &arguments.entries())
    }
}

impl BoundResource {
    /// Returns the buffer held by a bound resource, if any.
    pub fn buffer(&self) -> Option<&Buffer> {
        match self {
            BoundResource::Buffer(range) => Some(&range.buffer),
            _ => None,
        }
    }
}
