use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;

use super::{BackendKind, FrameError, FrameInput, RenderBackend, ResizeError, SurfaceInfo};

/// Counts render targets currently alive.
///
/// Every target registers on creation and deregisters on drop, so a steady
/// count across resize cycles means nothing leaked.
#[derive(Debug, Clone, Default)]
pub struct TargetLedger {
    live: Arc<AtomicUsize>,
    allocated: Arc<AtomicUsize>,
}

impl TargetLedger {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Targets ever created.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    fn register(&self) -> Registration {
        self.live.fetch_add(1, Ordering::Relaxed);
        self.allocated.fetch_add(1, Ordering::Relaxed);
        Registration {
            live: Arc::clone(&self.live),
        }
    }
}

#[derive(Debug)]
struct Registration {
    live: Arc<AtomicUsize>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct CpuTarget<T> {
    texels: Vec<T>,
    _registration: Registration,
}

impl<T: Copy> CpuTarget<T> {
    fn new(ledger: &TargetLedger, width: u32, height: u32, fill: T) -> Self {
        Self {
            texels: vec![fill; width as usize * height as usize],
            _registration: ledger.register(),
        }
    }
}

/// Size-dependent targets: a double-buffered color target and a depth target.
#[derive(Debug)]
struct Targets {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    back: CpuTarget<u32>,
    front: CpuTarget<u32>,
    depth: CpuTarget<f32>,
}

impl Targets {
    fn new(ledger: &TargetLedger, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            back: CpuTarget::new(ledger, width, height, 0),
            front: CpuTarget::new(ledger, width, height, 0),
            depth: CpuTarget::new(ledger, width, height, 1.0),
        }
    }
}

/// CPU rendering backend.
///
/// Frames are drawn into the back buffer and become visible only when the
/// swap at the end of a complete frame happens.
#[derive(Debug)]
pub struct SoftwareBackend {
    bound: bool,
    acquisitions: u64,
    binds: u64,
    max_dimension: u32,
    targets: Option<Targets>,
    ledger: TargetLedger,
    presented: u64,
}

impl SoftwareBackend {
    pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

    pub fn new() -> Self {
        Self::with_max_dimension(Self::DEFAULT_MAX_DIMENSION)
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            bound: false,
            acquisitions: 0,
            binds: 0,
            max_dimension,
            targets: None,
            ledger: TargetLedger::default(),
            presented: 0,
        }
    }

    pub fn supports_format(format: wgpu::TextureFormat) -> bool {
        matches!(
            format,
            wgpu::TextureFormat::Rgba8Unorm
                | wgpu::TextureFormat::Rgba8UnormSrgb
                | wgpu::TextureFormat::Bgra8Unorm
                | wgpu::TextureFormat::Bgra8UnormSrgb
        )
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Times a context was actually acquired (not merely re-bound).
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }

    /// Times `bind_context` was called.
    pub fn binds(&self) -> u64 {
        self.binds
    }

    pub fn ledger(&self) -> &TargetLedger {
        &self.ledger
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| (t.width, t.height))
    }

    /// Presented image bytes, row-major, in the surface format's channel order.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.targets
            .as_ref()
            .map(|t| bytemuck::cast_slice(&t.front.texels[..]))
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let t = self.targets.as_ref()?;
        if x >= t.width || y >= t.height {
            return None;
        }
        let idx = y as usize * t.width as usize + x as usize;
        Some(t.front.texels[idx].to_le_bytes())
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for SoftwareBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn bind_context(&mut self) -> Result<()> {
        self.binds += 1;
        if !self.bound {
            self.bound = true;
            self.acquisitions += 1;
            log::debug!("software context acquired (#{})", self.acquisitions);
        }
        Ok(())
    }

    fn release_context(&mut self) {
        if self.bound {
            log::debug!("software context released");
        }
        self.bound = false;
    }

    fn resize_targets(&mut self, surface: &SurfaceInfo) -> Result<(), ResizeError> {
        if !Self::supports_format(surface.format) {
            return Err(ResizeError::UnsupportedFormat(surface.format));
        }
        if surface.width > self.max_dimension || surface.height > self.max_dimension {
            return Err(ResizeError::TooLarge {
                width: surface.width,
                height: surface.height,
                max: self.max_dimension,
            });
        }

        if let Some(targets) = self.targets.as_mut() {
            if (targets.width, targets.height) == (surface.width, surface.height) {
                targets.format = surface.format;
                return Ok(());
            }
        }

        // Old targets drop (and deregister) on assignment.
        let targets = Targets::new(&self.ledger, surface.width, surface.height, surface.format);
        self.targets = Some(targets);
        Ok(())
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), FrameError> {
        if !self.bound {
            return Err(FrameError::Skipped("context not bound".to_string()));
        }
        let Some(targets) = self.targets.as_mut() else {
            return Err(FrameError::Skipped("no render targets".to_string()));
        };

        let clear = match targets.format {
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
                frame.clear.to_bgra8()
            }
            _ => frame.clear.to_rgba8(),
        };
        targets.back.texels.fill(clear);
        targets.depth.texels.fill(1.0);

        std::mem::swap(&mut targets.back, &mut targets.front);
        self.presented += 1;
        Ok(())
    }
}
