//! Skyline generation: the buildings of a round and where each gorilla
//! stands.
//!
//! Everything here is a pure function of a [`LevelConfig`] and an RNG, so
//! tests drive it with a seeded `StdRng`.

use gorillas_protocol::Building;
use rand::Rng;

use crate::{LevelConfig, MatchError};

/// Fewest buildings that leave room for both gorilla placement ranges.
pub const MIN_BUILDINGS: usize = 6;

/// The playing field of one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub buildings: Vec<Building>,
    /// Index into `buildings` for each seat.
    pub gorilla_buildings: [usize; 2],
}

/// Generates the buildings and gorilla placements for a round.
///
/// # Errors
/// Returns [`MatchError::Config`] if the configuration is invalid, if a
/// building can't be drawn distinct from its neighbour, or if too few
/// buildings fit on the map to place both gorillas.
pub fn generate_level<R: Rng>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<Level, MatchError> {
    let buildings = generate_buildings(config, rng)?;
    let gorilla_buildings = place_gorillas(buildings.len(), rng)?;
    Ok(Level {
        buildings,
        gorilla_buildings,
    })
}

/// Fills the map left to right with buildings drawn from the configured
/// ranges.
///
/// The last building is clipped so the widths sum to exactly
/// `map_width`. A building is redrawn while it has both the same width
/// and the same height as the one to its left; the comparison uses the
/// clipped width.
///
/// # Errors
/// Returns [`MatchError::Config`] if the configuration is invalid or the
/// resample budget runs out.
pub fn generate_buildings<R: Rng>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<Vec<Building>, MatchError> {
    config.validate()?;

    let mut buildings: Vec<Building> = Vec::new();
    let mut x = 0;

    while x < config.map_width {
        let previous = buildings.last().map(|b| (b.width, b.height));
        let (width, height) =
            draw_distinct(config, rng, config.map_width - x, previous)?;
        buildings.push(Building { x, width, height });
        x += width;
    }

    Ok(buildings)
}

/// Draws a (width, height) pair that differs from `previous` in at least
/// one dimension.
fn draw_distinct<R: Rng>(
    config: &LevelConfig,
    rng: &mut R,
    remaining: u32,
    previous: Option<(u32, u32)>,
) -> Result<(u32, u32), MatchError> {
    for _ in 0..=config.max_resample_attempts {
        let width = rng
            .random_range(config.min_building_width..=config.max_building_width)
            .min(remaining);
        let height = rng.random_range(
            config.min_building_height..=config.max_building_height,
        );
        if previous != Some((width, height)) {
            return Ok((width, height));
        }
    }

    Err(MatchError::Config(format!(
        "no building distinct from its neighbour after {} resamples",
        config.max_resample_attempts
    )))
}

/// Picks each gorilla's building: seat 0 somewhere in `1..=3`, seat 1 in
/// `count-4..=count-2`.
///
/// # Errors
/// Returns [`MatchError::Config`] if `building_count` is below
/// [`MIN_BUILDINGS`].
pub fn place_gorillas<R: Rng>(
    building_count: usize,
    rng: &mut R,
) -> Result<[usize; 2], MatchError> {
    if building_count < MIN_BUILDINGS {
        return Err(MatchError::Config(format!(
            "{building_count} buildings can't hold both gorillas \
             (need at least {MIN_BUILDINGS})"
        )));
    }

    Ok([
        rng.random_range(1..=3),
        rng.random_range(building_count - 4..=building_count - 2),
    ])
}
