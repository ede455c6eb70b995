#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Necrowarp adapters.
//!
//! Cells and entities expose a `draw(camera, offset)` hook that paints glyphs
//! into a [`Frame`]. Backends decide what a frame becomes; the text backend
//! shipped here prints it line by line.

use anyhow::Result as AnyResult;
use glam::IVec2;
use necrowarp_core::{
    CellState, CellTrait, EntityKind, MineralType, Position, RockType, ZoneRegion,
};
use necrowarp_world::{query, Entity, Map, World};
use std::{error::Error, fmt, io::Write};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Character and tint painted into a single frame cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Printed character.
    pub symbol: char,
    /// Foreground tint.
    pub foreground: Color,
}

impl Glyph {
    /// Creates a glyph.
    #[must_use]
    pub const fn new(symbol: char, foreground: Color) -> Self {
        Self { symbol, foreground }
    }
}

const BLANK: Glyph = Glyph::new(' ', Color::from_rgb_u8(0, 0, 0));

/// Glyph of a terrain cell, or `None` while the cell is unexplored.
#[must_use]
pub fn cell_glyph(state: CellState) -> Option<Glyph> {
    if state.has(CellTrait::Unexplored) {
        return None;
    }

    let rock = rock_color(state.rock());
    let glyph = if state.has(CellTrait::Open) {
        let symbol = if state.has(CellTrait::Rough) { ',' } else { '.' };
        Glyph::new(symbol, rock.lighten(0.5))
    } else if state.mineral() != MineralType::None {
        Glyph::new('$', rock.lighten(0.35))
    } else {
        Glyph::new('#', rock)
    };
    Some(glyph)
}

/// Glyph of an entity variant.
#[must_use]
pub const fn entity_glyph(kind: EntityKind) -> Glyph {
    match kind {
        EntityKind::Player => Glyph::new('@', Color::from_rgb_u8(160, 80, 220)),
        EntityKind::Skeleton => Glyph::new('s', Color::from_rgb_u8(230, 230, 210)),
        EntityKind::Wraith => Glyph::new('W', Color::from_rgb_u8(120, 200, 255)),
        EntityKind::Adventurer => Glyph::new('a', Color::from_rgb_u8(200, 160, 90)),
        EntityKind::Paladin => Glyph::new('P', Color::from_rgb_u8(250, 220, 100)),
        EntityKind::Priest => Glyph::new('+', Color::from_rgb_u8(255, 255, 255)),
        EntityKind::Ladder => Glyph::new('<', Color::from_rgb_u8(150, 110, 60)),
        EntityKind::Skull => Glyph::new('%', Color::from_rgb_u8(210, 200, 180)),
    }
}

const fn rock_color(rock: RockType) -> Color {
    match rock {
        RockType::Granite => Color::from_rgb_u8(110, 105, 100),
        RockType::Basalt => Color::from_rgb_u8(60, 60, 70),
        RockType::Limestone => Color::from_rgb_u8(190, 185, 160),
        RockType::Sandstone => Color::from_rgb_u8(190, 140, 90),
        RockType::Slate => Color::from_rgb_u8(80, 90, 100),
        RockType::Marble => Color::from_rgb_u8(220, 220, 225),
    }
}

/// Window onto the map expressed in map cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Camera {
    origin: IVec2,
    extent: IVec2,
}

impl Camera {
    /// Creates a camera whose top-left corner sits on `origin`.
    #[must_use]
    pub const fn new(origin: IVec2, extent: IVec2) -> Self {
        Self { origin, extent }
    }

    /// Centers a camera of `extent` cells on `focus`, keeping it inside `map`.
    #[must_use]
    pub fn centered(focus: Position, extent: IVec2, map: &Map) -> Self {
        let map_extent = IVec2::new(map.extent().width(), map.extent().height());
        let limit = (map_extent - extent).max(IVec2::ZERO);
        let origin = (IVec2::new(focus.x(), focus.y()) - extent / 2).clamp(IVec2::ZERO, limit);
        Self { origin, extent }
    }

    /// Map cell shown in the camera's top-left corner.
    #[must_use]
    pub const fn origin(&self) -> IVec2 {
        self.origin
    }

    /// Number of cells visible along each axis.
    #[must_use]
    pub const fn extent(&self) -> IVec2 {
        self.extent
    }

    /// Projects a map position into camera space, if it is visible.
    #[must_use]
    pub fn project(&self, position: Position) -> Option<IVec2> {
        let local = IVec2::new(position.x(), position.y()) - self.origin;
        let visible = local.cmpge(IVec2::ZERO).all() && local.cmplt(self.extent).all();
        visible.then_some(local)
    }
}

/// Anything the renderer paints once per frame.
pub trait Draw {
    /// Paints `self` as seen through `camera`, shifted by `offset` frame cells.
    fn draw(&self, camera: &Camera, offset: IVec2, frame: &mut Frame);
}

impl Draw for Map {
    fn draw(&self, camera: &Camera, offset: IVec2, frame: &mut Frame) {
        let positions = self.bounds().positions(ZoneRegion::All);
        for (position, state) in positions.zip(self.cells()) {
            let Some(local) = camera.project(position) else {
                continue;
            };
            if let Some(glyph) = cell_glyph(*state) {
                frame.put(local + offset, glyph);
            }
        }
    }
}

impl Draw for Entity {
    fn draw(&self, camera: &Camera, offset: IVec2, frame: &mut Frame) {
        if let Some(local) = camera.project(self.position()) {
            frame.put(local + offset, entity_glyph(self.kind()));
        }
    }
}

/// Fixed-size grid of glyphs produced for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: i32,
    height: i32,
    glyphs: Vec<Glyph>,
}

impl Frame {
    /// Creates a blank frame.
    ///
    /// Returns an error when either dimension is not positive.
    pub fn new(width: i32, height: i32) -> Result<Self, RenderingError> {
        if width <= 0 || height <= 0 {
            return Err(RenderingError::InvalidFrameExtent { width, height });
        }
        let len = width
            .checked_mul(height)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or(RenderingError::InvalidFrameExtent { width, height })?;
        Ok(Self {
            width,
            height,
            glyphs: vec![BLANK; len],
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Glyph painted at `point`, if it lies inside the frame.
    #[must_use]
    pub fn glyph(&self, point: IVec2) -> Option<Glyph> {
        self.index(point).map(|index| self.glyphs[index])
    }

    /// Paints `glyph` at `point`; points outside the frame are ignored.
    pub fn put(&mut self, point: IVec2, glyph: Glyph) {
        if let Some(index) = self.index(point) {
            self.glyphs[index] = glyph;
        }
    }

    fn index(&self, point: IVec2) -> Option<usize> {
        if point.x < 0 || point.y < 0 || point.x >= self.width || point.y >= self.height {
            return None;
        }
        usize::try_from(point.y * self.width + point.x).ok()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.glyphs.chunks(self.width as usize) {
            let line: String = row.iter().map(|glyph| glyph.symbol).collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown above the frame.
    pub title: String,
    /// Painted map and entities.
    pub frame: Frame,
    /// One-line summary of the player's counters.
    pub status: String,
}

impl Presentation {
    /// Paints the world as seen through `camera`.
    ///
    /// Terrain is drawn first and entities on top of it.
    pub fn compose(world: &World, camera: &Camera) -> Result<Self, RenderingError> {
        let mut frame = Frame::new(camera.extent().x, camera.extent().y)?;
        query::map(world).draw(camera, IVec2::ZERO, &mut frame);
        for entity in query::registry(world).iter() {
            entity.draw(camera, IVec2::ZERO, &mut frame);
        }

        let status = match query::player(world) {
            Some(Entity::Player { energy, armor, .. }) => format!(
                "turn {} | energy {}/{} | armor {}/{} | kills {}",
                query::turn(world),
                energy,
                query::max_energy(world),
                armor,
                query::max_armor(world),
                query::kills(world),
            ),
            _ => format!(
                "turn {} | the necromancer has fallen | kills {}",
                query::turn(world),
                query::kills(world),
            ),
        };

        Ok(Self {
            title: query::title(world).to_owned(),
            frame,
            status,
        })
    }
}

/// Rendering backend capable of presenting Necrowarp frames.
pub trait RenderingBackend {
    /// Presents one composed frame.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

/// Backend that prints frames as plain text.
#[derive(Debug)]
pub struct TextBackend<W> {
    writer: W,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing into `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        writeln!(self.writer, "{}", presentation.title)?;
        write!(self.writer, "{}", presentation.frame)?;
        writeln!(self.writer, "{}", presentation.status)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Frames need at least one row and one column.
    InvalidFrameExtent {
        /// Requested column count.
        width: i32,
        /// Requested row count.
        height: i32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFrameExtent { width, height } => {
                write!(f, "frame extent must be positive (received {width}x{height})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use necrowarp_core::{Bounds, Command, Extent, CLOSED_STATE, OPEN_STATE};
    use necrowarp_world::{self as world, Rules};

    fn small_world() -> World {
        let bounds = Bounds::new(Extent::new(8, 5), Extent::new(1, 1));
        let mut map = Map::filled(bounds, CLOSED_STATE);
        for position in bounds.positions(ZoneRegion::Interior) {
            if let Some(cell) = map.get_mut(position) {
                *cell = OPEN_STATE;
            }
        }
        let mut world = World::new(map, Rules::default());
        let mut events = Vec::new();
        for (kind, x, y) in [
            (EntityKind::Player, 2, 2),
            (EntityKind::Skull, 5, 2),
            (EntityKind::Ladder, 6, 3),
        ] {
            world::apply(
                &mut world,
                Command::Spawn {
                    kind,
                    position: Position::new(x, y),
                    announce: false,
                },
                &mut events,
            );
        }
        world
    }

    #[test]
    fn frame_creation_rejects_empty_extent_without_panicking() {
        assert_eq!(
            Frame::new(0, 4),
            Err(RenderingError::InvalidFrameExtent {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn unexplored_cells_stay_blank() {
        assert_eq!(cell_glyph(CellState::default()), None);
        assert_eq!(cell_glyph(OPEN_STATE).map(|glyph| glyph.symbol), Some('.'));
        assert_eq!(
            cell_glyph(CLOSED_STATE).map(|glyph| glyph.symbol),
            Some('#')
        );
    }

    #[test]
    fn camera_stays_inside_the_map() {
        let world = small_world();
        let camera = Camera::centered(Position::new(7, 4), IVec2::new(4, 3), query::map(&world));
        assert_eq!(camera.origin(), IVec2::new(4, 2));
        assert_eq!(camera.project(Position::new(4, 2)), Some(IVec2::ZERO));
        assert_eq!(camera.project(Position::new(3, 2)), None);
        assert_eq!(camera.project(Position::new(8, 2)), None);
    }

    #[test]
    fn entities_are_drawn_over_terrain() {
        let world = small_world();
        let camera = Camera::new(IVec2::ZERO, IVec2::new(8, 5));
        let presentation = Presentation::compose(&world, &camera).expect("positive extent");

        let text = presentation.frame.to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], "########");
        assert_eq!(rows[2], "#.@..%.#");
        assert_eq!(rows[3], "#.....<#");
        assert!(presentation.status.starts_with("turn 0 | energy 0/4"));
    }

    #[test]
    fn text_backend_prints_title_frame_and_status() {
        let world = small_world();
        let camera = Camera::new(IVec2::ZERO, IVec2::new(8, 5));
        let presentation = Presentation::compose(&world, &camera).expect("positive extent");
        let mut backend = TextBackend::new(Vec::new());
        backend.present(&presentation).expect("writing into memory");

        let printed = String::from_utf8(backend.into_inner()).expect("utf-8");
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], necrowarp_core::GAME_TITLE);
        assert_eq!(lines[6], presentation.status);
    }
}
