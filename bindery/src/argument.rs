use crate::{
    BindingLayoutEntry, BindingResource, BindingSetEntry, Buffer, BufferRange, ImageView, OwnedBufferRange, Sampler,
};

pub use bindery_macros::{Arguments, Vertex};

/// A struct of shader resources whose binding layout is known statically.
///
/// Implemented by `#[derive(Arguments)]`.
pub trait StaticArguments: Arguments {
    /// The binding layout declared by this struct.
    ///
    /// This can be used to create a `BindingLayout` without needing an instance.
    const LAYOUT: &'static [BindingLayoutEntry];
}

pub trait Arguments {
    /// Returns the resources contained in this object, one per declared slot.
    fn entries(&self) -> Vec<BindingSetEntry<'_>>;
}

/// Types that can be assigned to a slot of a binding set.
///
/// Used internally by the `Arguments` derive macro.
pub trait Argument {
    fn binding_resource(&self) -> BindingResource<'_>;
}

impl<T: Argument + ?Sized> Argument for &T {
    fn binding_resource(&self) -> BindingResource<'_> {
        (**self).binding_resource()
    }
}

impl Argument for ImageView {
    fn binding_resource(&self) -> BindingResource<'_> {
        BindingResource::TextureView(self)
    }
}

impl Argument for Sampler {
    fn binding_resource(&self) -> BindingResource<'_> {
        BindingResource::Sampler(self)
    }
}

impl Argument for Buffer {
    fn binding_resource(&self) -> BindingResource<'_> {
        BindingResource::Buffer(self.whole())
    }
}

impl<'a> Argument for BufferRange<'a> {
    fn binding_resource(&self) -> BindingResource<'_> {
        BindingResource::Buffer(*self)
    }
}

impl Argument for OwnedBufferRange {
    fn binding_resource(&self) -> BindingResource<'_> {
        BindingResource::Buffer(self.as_range())
    }
}
