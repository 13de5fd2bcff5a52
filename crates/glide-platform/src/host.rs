use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use glide_core::{Clock, KeyEvent, PointerEvent, SystemClock};
use glide_ui::list::{ListController, ScrollStep, TapTarget};
use glide_ui::{Background, Canvas, Stretch, SurfaceCache};
use image::RgbaImage;
use web_time::Duration;

use crate::config::HostConfig;
use crate::image_loader::{ImageLoader, LoadError};
use crate::timer::AnimationTimer;

/// Drives one list: pumps image completions, ticks scroll animation on the
/// timer and renders frames into an owned bitmap.
///
/// The list is shared as `Rc<RefCell<_>>` so event observers can hold on
/// to it. A tick that arrives while the list is already borrowed (an
/// observer reacting to the previous tick, say) is dropped, not queued.
pub struct ListHost<C: Clock = SystemClock> {
    list: Rc<RefCell<ListController>>,
    cache: SurfaceCache,
    loader: ImageLoader,
    timer: AnimationTimer<C>,
    frame: RgbaImage,
    frames: u64,
    dropped_ticks: u64,
}

impl ListHost<SystemClock> {
    pub fn new(config: &HostConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ListHost<C> {
    pub fn with_clock(config: &HostConfig, clock: C) -> anyhow::Result<Self> {
        let viewport = config.viewport();
        let (w, h) = viewport.to_pixels();
        anyhow::ensure!(w > 0 && h > 0, "viewport must not be empty");

        let mut list = ListController::new(config.list.clone());
        list.set_viewport(viewport);
        let loader = ImageLoader::new(config.image_workers).with_context(|| {
            format!("starting {} image worker threads", config.image_workers)
        })?;
        let mut timer = AnimationTimer::new(
            clock,
            Duration::from_millis(config.list.tick_interval_ms),
        );
        timer.start();
        log::info!(
            "list host ready: {w}x{h}, {} image workers, {} ms ticks",
            config.image_workers,
            config.list.tick_interval_ms
        );
        Ok(Self {
            list: Rc::new(RefCell::new(list)),
            cache: SurfaceCache::new(config.cache.clone()),
            loader,
            timer,
            frame: RgbaImage::new(w, h),
            frames: 0,
            dropped_ticks: 0,
        })
    }

    /// Shared handle to the list.
    pub fn list(&self) -> Rc<RefCell<ListController>> {
        self.list.clone()
    }

    pub fn cache(&self) -> &SurfaceCache {
        &self.cache
    }

    pub fn loader_mut(&mut self) -> &mut ImageLoader {
        &mut self.loader
    }

    pub fn timer(&self) -> &AnimationTimer<C> {
        &self.timer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    /// Load `source` as the list background. The current background stays
    /// up until the image has decoded.
    pub fn load_background(&mut self, source: &str, stretch: Stretch) -> Result<(), LoadError> {
        let (background, slot) = Background::image(stretch);
        self.loader.load(&slot, source)?;
        self.list.borrow_mut().set_background(background);
        Ok(())
    }

    /// Advance the list one scroll tick. Returns `None` if the list is
    /// borrowed elsewhere.
    pub fn tick(&mut self) -> Option<ScrollStep> {
        let Ok(mut list) = self.list.try_borrow_mut() else {
            self.dropped_ticks += 1;
            log::debug!("list busy; tick dropped");
            return None;
        };
        Some(list.tick())
    }

    /// One turn of the host loop: apply finished image loads, then tick if
    /// the timer is due. Returns true when a tick ran.
    pub fn run_once(&mut self) -> bool {
        let landed = self.loader.pump();
        if landed > 0 {
            log::debug!("{landed} images landed");
        }
        self.timer.poll() && self.tick().is_some()
    }

    /// Tick until the list comes to rest, without waiting on the timer.
    /// Returns the number of ticks taken.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        for n in 1..=max_ticks {
            match self.tick() {
                Some(step) if step.at_rest => return n,
                Some(_) => {}
                None => return n,
            }
        }
        max_ticks
    }

    pub fn pointer(&mut self, event: &PointerEvent) -> Option<TapTarget> {
        self.list.borrow_mut().handle_pointer(event)
    }

    pub fn key(&mut self, event: &KeyEvent) -> bool {
        self.list.borrow_mut().handle_key(event)
    }

    pub fn activate(&mut self) {
        self.timer.start();
        self.list.borrow_mut().activate();
    }

    pub fn deactivate(&mut self) {
        self.timer.stop();
        self.list.borrow_mut().deactivate();
    }

    /// Paint the current state of the list.
    pub fn render(&mut self) -> anyhow::Result<&RgbaImage> {
        let mut list = self
            .list
            .try_borrow_mut()
            .map_err(|_| anyhow::anyhow!("list is borrowed; cannot render"))?;
        let (w, h) = list.viewport().to_pixels();
        anyhow::ensure!(w > 0 && h > 0, "viewport must not be empty");
        if self.frame.dimensions() != (w, h) {
            log::debug!("frame resized to {w}x{h}");
            self.frame = RgbaImage::new(w, h);
        }
        let mut canvas = Canvas::new(&mut self.frame);
        let stats = list.paint(&mut self.cache, &mut canvas);
        self.frames += 1;
        log::trace!(
            "frame {}: {} painted, {} reused, {} skipped, cache {} bytes",
            self.frames,
            stats.painted,
            stats.reused,
            stats.skipped,
            self.cache.bytes()
        );
        Ok(&self.frame)
    }

    pub fn save_frame(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.render()?;
        self.frame
            .save(path)
            .with_context(|| format!("writing frame to {}", path.display()))?;
        log::info!("frame saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glide_core::{Color, ManualClock, PointerButton, PointerEventKind, Size, Vec2};
    use glide_ui::elements::Block;
    use glide_ui::list::{GridCell, Section};
    use image::Rgba;

    use super::*;

    fn config() -> HostConfig {
        HostConfig {
            viewport_width: 100,
            viewport_height: 100,
            image_workers: 0,
            ..HostConfig::default()
        }
    }

    fn host_with(clock: Rc<ManualClock>, items: usize) -> ListHost<Rc<ManualClock>> {
        let host = ListHost::with_clock(&config(), clock).unwrap();
        {
            let list = host.list();
            let mut list = list.borrow_mut();
            list.on_cell_requested(|_, _, recycled| {
                recycled.or_else(|| {
                    Some(GridCell::item().with_child(Block::new(Size::new(10.0, 40.0), Color::BLACK)))
                })
            });
            list.reload_sections(vec![Section::new(items)]);
        }
        host
    }

    #[test]
    fn render_paints_rows_over_background() {
        let mut host = host_with(Rc::new(ManualClock::new()), 1);
        let frame = host.render().unwrap();
        assert_eq!(frame.dimensions(), (100, 100));
        assert_eq!(frame.get_pixel(50, 10), &Rgba([0, 0, 0, 255]));
        assert_eq!(frame.get_pixel(50, 80), &Rgba([255, 255, 255, 255]));
        assert_eq!(host.frames(), 1);
    }

    #[test]
    fn busy_list_drops_tick() {
        let mut host = host_with(Rc::new(ManualClock::new()), 3);
        let list = host.list();
        let guard = list.borrow_mut();
        assert!(host.tick().is_none());
        assert_eq!(host.dropped_ticks(), 1);
        drop(guard);
        assert!(host.tick().is_some());
    }

    #[test]
    fn timer_paces_ticks() {
        let clock = Rc::new(ManualClock::new());
        let mut host = host_with(clock.clone(), 20);
        assert!(!host.run_once());
        clock.advance_ms(30);
        assert!(host.run_once());
        assert!(!host.run_once());
        host.deactivate();
        clock.advance_ms(60);
        assert!(!host.run_once());
    }

    #[test]
    fn drag_then_settle_moves_frame() {
        let mut host = host_with(Rc::new(ManualClock::new()), 20);
        host.pointer(&PointerEvent::touch(
            PointerEventKind::Down(PointerButton::Primary),
            Vec2::new(10.0, 90.0),
        ));
        for y in [80.0, 60.0, 40.0] {
            host.pointer(&PointerEvent::touch(PointerEventKind::Move, Vec2::new(10.0, y)));
            host.tick();
        }
        host.pointer(&PointerEvent::touch(
            PointerEventKind::Up(PointerButton::Primary),
            Vec2::new(10.0, 40.0),
        ));
        let ticks = host.settle(200);
        assert!(ticks < 200);
        let offset = host.list().borrow().offset();
        assert!(offset < -40.0);
        host.render().unwrap();
    }

    #[test]
    fn background_image_arrives_through_pump() {
        let mut host = host_with(Rc::new(ManualClock::new()), 0);
        let mut png = std::io::Cursor::new(Vec::new());
        RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255]))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let uri = format!(
            "data:image/png;base64,{}",
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, png.into_inner())
        );
        host.load_background(&uri, Stretch::Fill).unwrap();
        assert_eq!(
            host.render().unwrap().get_pixel(50, 50),
            &Rgba([255, 255, 255, 255])
        );
        host.run_once();
        assert_eq!(host.render().unwrap().get_pixel(50, 50), &Rgba([200, 0, 0, 255]));
    }
}
