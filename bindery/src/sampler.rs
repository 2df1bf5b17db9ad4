use ordered_float::OrderedFloat;
use tracing::debug;

use crate::{vk, Device, Error, SamplerId, WeakDevice};

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum Filter {
    Nearest,
    Linear,
}

impl Filter {
    pub const fn to_vk_filter(self) -> vk::Filter {
        match self {
            Self::Nearest => vk::Filter::NEAREST,
            Self::Linear => vk::Filter::LINEAR,
        }
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum MipmapMode {
    Nearest,
    Linear,
}

impl MipmapMode {
    pub const fn to_vk_sampler_mipmap_mode(self) -> vk::SamplerMipmapMode {
        match self {
            Self::Nearest => vk::SamplerMipmapMode::NEAREST,
            Self::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

/// Edge handling of texture coordinates outside of `[0, 1]`.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

impl AddressMode {
    pub const fn to_vk_sampler_address_mode(self) -> vk::SamplerAddressMode {
        match self {
            Self::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            Self::Repeat => vk::SamplerAddressMode::REPEAT,
            Self::MirrorRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        }
    }
}

/// Comparison function of depth-compare samplers.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

impl CompareOp {
    pub const fn to_vk_compare_op(self) -> vk::CompareOp {
        match self {
            Self::Never => vk::CompareOp::NEVER,
            Self::Less => vk::CompareOp::LESS,
            Self::Equal => vk::CompareOp::EQUAL,
            Self::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
            Self::Greater => vk::CompareOp::GREATER,
            Self::NotEqual => vk::CompareOp::NOT_EQUAL,
            Self::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
            Self::Always => vk::CompareOp::ALWAYS,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct SamplerCreateInfo {
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_mode: MipmapMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub min_lod: OrderedFloat<f32>,
    pub max_lod: OrderedFloat<f32>,
    pub compare: Option<CompareOp>,
}

impl Default for SamplerCreateInfo {
    fn default() -> Self {
        SamplerCreateInfo {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_mode: MipmapMode::Linear,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            min_lod: 0.0.into(),
            max_lod: 32.0.into(),
            compare: None,
        }
    }
}

impl SamplerCreateInfo {
    /// Same address mode on all axes.
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode_u = mode;
        self.address_mode_v = mode;
        self.address_mode_w = mode;
        self
    }

    pub fn to_vk(&self) -> vk::SamplerCreateInfo {
        vk::SamplerCreateInfo {
            mag_filter: self.mag_filter.to_vk_filter(),
            min_filter: self.min_filter.to_vk_filter(),
            mipmap_mode: self.mipmap_mode.to_vk_sampler_mipmap_mode(),
            address_mode_u: self.address_mode_u.to_vk_sampler_address_mode(),
            address_mode_v: self.address_mode_v.to_vk_sampler_address_mode(),
            address_mode_w: self.address_mode_w.to_vk_sampler_address_mode(),
            compare_enable: self.compare.is_some().into(),
            compare_op: self.compare.unwrap_or(CompareOp::Always).to_vk_compare_op(),
            min_lod: self.min_lod.into_inner(),
            max_lod: self.max_lod.into_inner(),
            border_color: vk::BorderColor::INT_OPAQUE_BLACK,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let (min, max) = (self.min_lod.into_inner(), self.max_lod.into_inner());
        if min.is_nan() || max.is_nan() || min < 0.0 || max < 0.0 {
            return Err(Error::InvalidArgument(format!("invalid LOD clamp range {min}..={max}")));
        }
        if min > max {
            return Err(Error::InvalidArgument(format!(
                "min LOD ({min}) is greater than max LOD ({max})"
            )));
        }
        Ok(())
    }
}

/// Handle to a sampler.
///
/// Samplers are immutable and shared: the device returns the same sampler for equal create
/// infos.
#[derive(Clone, Debug)]
pub struct Sampler {
    // A weak ref is sufficient, the device already owns samplers in its cache
    device: WeakDevice,
    id: SamplerId,
    info: SamplerCreateInfo,
}

impl Sampler {
    pub fn id(&self) -> SamplerId {
        self.id
    }

    pub fn info(&self) -> &SamplerCreateInfo {
        &self.info
    }

    /// Returns the device that created this sampler.
    pub fn device(&self) -> &WeakDevice {
        &self.device
    }

    /// Whether the device that created this sampler is still alive.
    pub fn is_valid(&self) -> bool {
        self.device.upgrade().is_some()
    }
}

impl PartialEq for Sampler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.device.inner_ptr_eq(&other.device)
    }
}

impl Eq for Sampler {}

impl Device {
    /// Returns a sampler matching `info`, creating it if an equal one isn't cached yet.
    pub fn create_sampler(&self, info: &SamplerCreateInfo) -> Result<Sampler, Error> {
        info.validate()?;
        if let Some(sampler) = self.inner.sampler_cache.borrow().get(info) {
            return Ok(sampler.clone());
        }
        let id = self.inner.samplers.borrow_mut().insert(info.clone());
        debug!(?id, ?info, "create sampler");
        let sampler = Sampler {
            device: self.weak(),
            id,
            info: info.clone(),
        };
        self.inner.sampler_cache.borrow_mut().insert(info.clone(), sampler.clone());
        Ok(sampler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sampler_to_vk() {
        let vk_info = SamplerCreateInfo::default().to_vk();
        assert_eq!(vk_info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(vk_info.address_mode_v, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(vk_info.compare_enable, vk::FALSE);
        assert_eq!(vk_info.max_lod, 32.0);
    }

    #[test]
    fn compare_sampler_to_vk() {
        let info = SamplerCreateInfo {
            compare: Some(CompareOp::LessOrEqual),
            ..Default::default()
        };
        let vk_info = info.to_vk();
        assert_eq!(vk_info.compare_enable, vk::TRUE);
        assert_eq!(vk_info.compare_op, vk::CompareOp::LESS_OR_EQUAL);
    }

    #[test]
    fn lod_range_is_validated() {
        let info = SamplerCreateInfo {
            min_lod: 4.0.into(),
            max_lod: 1.0.into(),
            ..Default::default()
        };
        assert!(info.validate().is_err());
        let info = SamplerCreateInfo {
            min_lod: f32::NAN.into(),
            ..Default::default()
        };
        assert!(info.validate().is_err());
        assert!(SamplerCreateInfo::default().validate().is_ok());
    }
}
