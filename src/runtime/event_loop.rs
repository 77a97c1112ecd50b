use std::time::Instant;

use crossterm::event::{self, Event, KeyEventKind};

use crate::ui;

use super::controller::{Control, Controller};
use super::startup::Tui;

/// Drive `controller` against the real terminal until the user quits or
/// refuses library access.
pub fn run(mut controller: Controller<'_>, terminal: &mut Tui) -> anyhow::Result<()> {
    let mut control = controller.start()?;

    loop {
        while control == Control::OpenSettings {
            controller.host().open_settings(terminal)?;
            control = controller.settings_returned()?;
        }
        if control == Control::Quit {
            return Ok(());
        }

        let width = terminal.size()?.width;
        control = controller.update(Instant::now(), width)?;
        if control != Control::Continue {
            continue;
        }
        terminal.draw(|f| ui::draw(f, &controller.view()))?;

        if !event::poll(controller.poll_timeout())? {
            continue;
        }
        control = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => controller.handle_key(key)?,
            Event::FocusGained => controller.foregrounded()?,
            _ => Control::Continue,
        };
    }
}
