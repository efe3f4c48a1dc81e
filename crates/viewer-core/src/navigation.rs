//! Maps user and platform events to viewer commands.

/// Something the user or the host platform did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    PrevButton,
    NextButton,
    /// Click inside the spread; `x` is relative to the spread's left edge.
    SpreadClick { x: f32, width: f32 },
    Key(NavKey),
    Resize,
    ToggleFullscreen,
    FullscreenChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Prev,
    Next,
    First,
    Last,
    Resize,
    ToggleFullscreen,
    /// Container geometry changed underneath us; draw again.
    Rerender,
}

pub fn route(event: ViewerEvent) -> Command {
    match event {
        ViewerEvent::PrevButton => Command::Prev,
        ViewerEvent::NextButton => Command::Next,
        ViewerEvent::SpreadClick { x, width } => click_zone(x, width),
        ViewerEvent::Key(key) => key_command(key),
        ViewerEvent::Resize => Command::Resize,
        ViewerEvent::ToggleFullscreen => Command::ToggleFullscreen,
        ViewerEvent::FullscreenChanged => Command::Rerender,
    }
}

/// Left half turns back, right half (including the midline) turns forward.
pub fn click_zone(x: f32, width: f32) -> Command {
    if x < width / 2.0 {
        Command::Prev
    } else {
        Command::Next
    }
}

fn key_command(key: NavKey) -> Command {
    match key {
        NavKey::ArrowLeft | NavKey::PageUp => Command::Prev,
        NavKey::ArrowRight | NavKey::PageDown => Command::Next,
        NavKey::Home => Command::First,
        NavKey::End => Command::Last,
    }
}
