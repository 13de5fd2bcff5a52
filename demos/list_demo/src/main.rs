use glide_core::{Color, PointerButton, PointerEvent, PointerEventKind, Size, Vec2};
use glide_platform::{HostConfig, ListHost, init_logging};
use glide_ui::PlacementExt;
use glide_ui::elements::{Block, Label, Toggle};
use glide_ui::grid::{GridContainer, Track};
use glide_ui::list::{GridCell, ItemId, ListEvent, Section};

fn row(section: usize, index: usize) -> GridCell {
    let stripe = if section == 0 {
        Color::from_hex("#2E7D32")
    } else {
        Color::from_hex("#9E9E9E")
    };
    let grid = GridContainer::new()
        .with_columns([Track::Fixed(6.0), Track::star(), Track::Fixed(51.0)])
        .with_rows([Track::Auto])
        .with_child(Block::new(Size::new(6.0, 44.0), stripe))
        .with_child(Label::new(format!("Message #{}", index + 1)).at(0, 1))
        .with_child(Toggle::new(format!("flag.{section}.{index}")).at(0, 2));
    GridCell::item()
        .with_grid(grid)
        .with_link(format!("mail/{section}/{index}"))
}

fn drag(host: &mut ListHost, from: f32, to: f32, steps: usize) {
    let x = 40.0;
    host.pointer(&PointerEvent::touch(
        PointerEventKind::Down(PointerButton::Primary),
        Vec2::new(x, from),
    ));
    let step = (to - from) / steps as f32;
    for i in 1..=steps {
        let y = from + step * i as f32;
        host.pointer(&PointerEvent::touch(PointerEventKind::Move, Vec2::new(x, y)));
        host.tick();
    }
    host.pointer(&PointerEvent::touch(
        PointerEventKind::Up(PointerButton::Primary),
        Vec2::new(x, to),
    ));
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let out = args.next().unwrap_or_else(|| "list_demo.png".into());
    let config = match args.next() {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };

    let mut host = ListHost::new(&config)?;
    {
        let list = host.list();
        let mut list = list.borrow_mut();
        list.events().subscribe(|e| match e {
            ListEvent::Scrolling => log::info!("scrolling"),
            other => log::debug!("{other:?}"),
        });
        list.on_item_id_requested(|s, i| ItemId(format!("{s}.{i}")));
        list.on_cell_requested(|section, index, recycled| {
            recycled.or_else(|| Some(row(section, index)))
        });
        list.reload_sections(vec![
            Section::new(200).header("Inbox"),
            Section::new(60).header("Archive").footer("End of archive"),
        ]);
    }
    host.activate();

    drag(&mut host, 400.0, 120.0, 6);
    let ticks = host.settle(500);
    {
        let list = host.list();
        let list = list.borrow();
        log::info!(
            "fling settled after {ticks} ticks at offset {:.1}; {} rows materialized",
            list.offset(),
            list.rows().len()
        );
    }

    host.list().borrow_mut().scroll_to_cell(1, 0, true)?;
    host.settle(500);
    host.save_frame(&out)?;

    let stats = host.cache().stats();
    log::info!(
        "{} frames, {} surfaces ({} bytes), {} evictions",
        host.frames(),
        host.cache().len(),
        host.cache().bytes(),
        stats.evictions
    );
    Ok(())
}
