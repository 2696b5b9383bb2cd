use super::ResizeError;

/// Snapshot of the drawing surface handed to `Renderer::resize`.
///
/// The platform surface itself stays owned by the window layer; renderers only
/// keep this description of it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceInfo {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Physical pixels per logical pixel.
    pub scale_factor: f64,
    pub format: wgpu::TextureFormat,
}

impl SurfaceInfo {
    pub fn new(width: u32, height: u32, scale_factor: f64, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            scale_factor,
            format,
        }
    }

    /// Logical size as `(width, height)`.
    pub fn logical_size(&self) -> (f64, f64) {
        (
            self.width as f64 / self.scale_factor,
            self.height as f64 / self.scale_factor,
        )
    }

    /// Backend-independent checks: the surface must have area, a usable scale
    /// factor, and a color-renderable format.
    pub fn validate(&self) -> Result<(), ResizeError> {
        if self.width == 0 || self.height == 0 {
            return Err(ResizeError::ZeroArea {
                width: self.width,
                height: self.height,
            });
        }

        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(ResizeError::InvalidScaleFactor(self.scale_factor));
        }

        if self.format.is_depth_stencil_format() || self.format.is_compressed() {
            return Err(ResizeError::UnsupportedFormat(self.format));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    #[test]
    fn zero_area_is_rejected() {
        let s = SurfaceInfo::new(0, 720, 1.0, FORMAT);
        assert_eq!(
            s.validate(),
            Err(ResizeError::ZeroArea { width: 0, height: 720 })
        );
    }

    #[test]
    fn bad_scale_factor_is_rejected() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let s = SurfaceInfo::new(100, 100, scale, FORMAT);
            assert!(matches!(s.validate(), Err(ResizeError::InvalidScaleFactor(_))));
        }
    }

    #[test]
    fn depth_format_is_not_a_color_surface() {
        let s = SurfaceInfo::new(100, 100, 1.0, wgpu::TextureFormat::Depth32Float);
        assert_eq!(
            s.validate(),
            Err(ResizeError::UnsupportedFormat(wgpu::TextureFormat::Depth32Float))
        );
    }

    #[test]
    fn logical_size_divides_by_scale() {
        let s = SurfaceInfo::new(200, 100, 2.0, FORMAT);
        assert_eq!(s.validate(), Ok(()));
        assert_eq!(s.logical_size(), (100.0, 50.0));
    }
}
