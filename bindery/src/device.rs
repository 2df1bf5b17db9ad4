//! The emulated device, its resource arenas and its configuration.
mod resource;

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use fxhash::FxHashMap;
use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::{Error, Queue, Sampler, SamplerCreateInfo};

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Device limits checked by resource creation and pipeline wiring.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of vertex buffers a pipeline can fetch from.
    pub max_vertex_buffers: u32,
    /// Maximum number of vertex attributes across all vertex buffers of a pipeline.
    pub max_vertex_attributes: u32,
    /// Maximum number of binding layouts (set indices) in a pipeline.
    pub max_binding_sets: u32,
    pub max_bindings_per_layout: u32,
    /// Maximum width or height of an image.
    pub max_texture_dimension_2d: u32,
    /// Maximum size of a buffer in bytes.
    pub max_buffer_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_vertex_buffers: 8,
            max_vertex_attributes: 16,
            max_binding_sets: 4,
            max_bindings_per_layout: 16,
            max_texture_dimension_2d: 8192,
            max_buffer_size: 256 << 20,
        }
    }
}

impl Limits {
    /// A smaller profile, for testing against constrained hardware.
    pub fn downlevel() -> Limits {
        Limits {
            max_vertex_buffers: 4,
            max_vertex_attributes: 8,
            max_binding_sets: 2,
            max_bindings_per_layout: 8,
            max_texture_dimension_2d: 2048,
            max_buffer_size: 128 << 20,
        }
    }
}

/// Parameters of `create_device_and_queue`.
#[derive(Clone, Debug, Default)]
pub struct DeviceCreateInfo {
    /// Debug label of the device.
    pub label: String,
    pub limits: Limits,
}

////////////////////////////////////////////////////////////////////////////////////////////////////

slotmap::new_key_type! {
    /// Identifies a buffer resource.
    pub struct BufferId;
    /// Identifies an image resource.
    pub struct ImageId;
    /// Identifies a sampler.
    pub struct SamplerId;
    /// Identifies a binding layout.
    pub struct BindingLayoutId;
}

/// Memory backing a buffer.
pub(crate) struct BufferResource {
    pub(crate) label: String,
    pub(crate) data: Vec<u8>,
}

/// Texels of an image, tightly packed, rows of each depth slice one after the other.
pub(crate) struct ImageResource {
    pub(crate) label: String,
    pub(crate) data: Vec<u8>,
}

pub(crate) struct DeviceInner {
    label: String,
    limits: Limits,
    pub(crate) buffers: RefCell<SlotMap<BufferId, BufferResource>>,
    pub(crate) images: RefCell<SlotMap<ImageId, ImageResource>>,
    pub(crate) samplers: RefCell<SlotMap<SamplerId, SamplerCreateInfo>>,
    pub(crate) binding_layouts: RefCell<SlotMap<BindingLayoutId, String>>,
    pub(crate) sampler_cache: RefCell<FxHashMap<SamplerCreateInfo, Sampler>>,
}

/// Handle to the emulated device.
///
/// Cloning the handle is cheap. Resources created on the device keep it alive.
#[derive(Clone)]
pub struct Device {
    pub(crate) inner: Rc<DeviceInner>,
}

/// Weak reference to a device.
#[derive(Clone)]
pub struct WeakDevice {
    inner: Weak<DeviceInner>,
}

impl WeakDevice {
    pub fn upgrade(&self) -> Option<Device> {
        self.inner.upgrade().map(|inner| Device { inner })
    }

    /// Whether this refers to `device`.
    pub fn ptr_eq(&self, device: &Device) -> bool {
        Weak::as_ptr(&self.inner) == Rc::as_ptr(&device.inner)
    }

    pub(crate) fn inner_ptr_eq(&self, other: &WeakDevice) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for WeakDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WeakDevice").finish_non_exhaustive()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Device").field("label", &self.inner.label).finish()
    }
}

/// Creates a device and its (single) submission queue.
pub fn create_device_and_queue(info: &DeviceCreateInfo) -> (Device, Queue) {
    let device = Device::new(info);
    let queue = Queue::new(device.clone());
    (device, queue)
}

impl Device {
    fn new(info: &DeviceCreateInfo) -> Device {
        debug!(label = info.label.as_str(), limits = ?info.limits, "creating device");
        Device {
            inner: Rc::new(DeviceInner {
                label: info.label.clone(),
                limits: info.limits,
                buffers: RefCell::new(SlotMap::with_key()),
                images: RefCell::new(SlotMap::with_key()),
                samplers: RefCell::new(SlotMap::with_key()),
                binding_layouts: RefCell::new(SlotMap::with_key()),
                sampler_cache: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    pub fn weak(&self) -> WeakDevice {
        WeakDevice {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn limits(&self) -> &Limits {
        &self.inner.limits
    }

    /// Number of buffers that haven't been dropped yet, including staging buffers still
    /// referenced by unsubmitted command lists.
    pub fn live_buffer_count(&self) -> usize {
        self.inner.buffers.borrow().len()
    }

    pub fn live_image_count(&self) -> usize {
        self.inner.images.borrow().len()
    }

    /// Number of distinct samplers in the sampler cache.
    pub fn sampler_count(&self) -> usize {
        self.inner.samplers.borrow().len()
    }

    pub fn live_binding_layout_count(&self) -> usize {
        self.inner.binding_layouts.borrow().len()
    }

    /// Labels of the buffers, images and binding layouts that are still alive.
    pub fn live_resource_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = vec![];
        labels.extend(self.inner.buffers.borrow().values().map(|b| b.label.clone()));
        labels.extend(self.inner.images.borrow().values().map(|i| i.label.clone()));
        labels.extend(self.inner.binding_layouts.borrow().values().cloned());
        labels
    }

    pub fn ptr_eq(&self, other: &Device) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Fails if `owner`, the device that created `resource`, is not this device.
    pub(crate) fn check_owner(&self, owner: &Device, resource: &str) -> Result<(), Error> {
        if !self.ptr_eq(owner) {
            warn!(device = self.label(), owner = owner.label(), resource, "resource used on a foreign device");
            return Err(Error::ForeignResource {
                resource: resource.to_string(),
                device: self.label().to_string(),
            });
        }
        Ok(())
    }

    /// Allocates the zeroed memory of a resource, or fails if it can't be allocated.
    pub(crate) fn allocate(&self, label: &str, byte_size: u64) -> Result<Vec<u8>, Error> {
        let len = usize::try_from(byte_size).map_err(|_| {
            Error::InvalidArgument(format!("`{label}` is too large to allocate ({byte_size} bytes)"))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|err| {
            warn!(label, byte_size, "allocation failed");
            Error::InvalidArgument(format!("cannot allocate `{label}` ({byte_size} bytes): {err}"))
        })?;
        data.resize(len, 0);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downlevel_limits_are_smaller() {
        let default = Limits::default();
        let low = Limits::downlevel();
        assert!(low.max_vertex_buffers < default.max_vertex_buffers);
        assert!(low.max_binding_sets < default.max_binding_sets);
        assert_eq!(low.max_texture_dimension_2d, 2048);
        assert!(low.max_buffer_size < default.max_buffer_size);
    }

    #[test]
    fn resources_of_other_devices_are_rejected() {
        let (a, _qa) = create_device_and_queue(&DeviceCreateInfo {
            label: "a".to_string(),
            ..Default::default()
        });
        let (b, _qb) = create_device_and_queue(&DeviceCreateInfo::default());
        assert!(a.check_owner(&a.clone(), "mine").is_ok());
        assert!(matches!(
            a.check_owner(&b, "theirs"),
            Err(Error::ForeignResource { ref resource, ref device }) if resource == "theirs" && device == "a"
        ));
        assert!(a.weak().ptr_eq(&a));
        assert!(!a.weak().ptr_eq(&b));
    }

    #[test]
    fn weak_device_does_not_keep_device_alive() {
        let (device, queue) = create_device_and_queue(&DeviceCreateInfo::default());
        let weak = device.weak();
        assert!(weak.upgrade().is_some());
        drop(queue);
        drop(device);
        assert!(weak.upgrade().is_none());
    }
}
