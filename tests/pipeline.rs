//! End-to-end pipeline tests through `MapSession`.

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use tilex::classify::{Matcher, Rule, TypeRegistry};
use tilex::export::read_index;
use tilex::types::{GridCoord, PixelBuffer, Rgb, TileCategory, TileType};
use tilex::{export_unique_tiles, MapSession, SessionConfig, TileError};

const BASE: [u8; 4] = [120, 80, 40, 255];

/// Build an image from a grid of solid-colour cells.
fn solid_cells(cells: &[&[[u8; 4]]], tile: u32) -> PixelBuffer {
    let rows = cells.len() as u32;
    let cols = cells[0].len() as u32;
    let (w, h) = (cols * tile, rows * tile);
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&cells[(y / tile) as usize][(x / tile) as usize]);
        }
    }
    PixelBuffer::new(w, h, data).unwrap()
}

fn session_14() -> MapSession {
    MapSession::new(
        SessionConfig {
            tile_width: 14,
            tile_height: 14,
            ..SessionConfig::default()
        },
        TypeRegistry::new(),
    )
}

#[tokio::test]
async fn test_28x28_scenario_single_class() {
    // (0,0) and (1,1) identical; (1,0) is red +3, (0,1) is green +3.
    let red = [BASE[0] + 3, BASE[1], BASE[2], 255];
    let green = [BASE[0], BASE[1] + 3, BASE[2], 255];
    let image = solid_cells(&[&[BASE, red], &[green, BASE]], 14);

    let mut session = session_14();
    session.load_image(image);
    let report = session.analyze().await.unwrap();

    assert_eq!(report.tile_count, 4);
    assert_eq!(report.unique_count, 1);
    assert_eq!(report.class_sizes, vec![4]);

    let unique = session.unique_tiles().unwrap();
    let classes = unique.classes();
    assert_eq!(classes[0].representative.coord(), GridCoord::new(0, 0));
    assert_eq!(
        classes[0].members,
        vec![
            GridCoord::new(0, 0),
            GridCoord::new(1, 0),
            GridCoord::new(0, 1),
            GridCoord::new(1, 1),
        ]
    );
    for coord in unique.assignment().keys() {
        let rep = session.representative_of(*coord).unwrap();
        assert_eq!(rep.coord(), GridCoord::new(0, 0));
    }
}

#[tokio::test]
async fn test_tolerance_chain_follows_scan_order() {
    // Greys 100, 104, 108 in one row: 100~104 and 104~108, but 100 !~ 108.
    // Scanning row-major, 104 joins 100's class and 108 starts its own.
    let grey = |v: u8| [v, v, v, 255];
    let image = solid_cells(&[&[grey(100), grey(104), grey(108)]], 14);

    let mut session = session_14();
    session.load_image(image);
    let report = session.analyze().await.unwrap();

    assert_eq!(report.unique_count, 2);
    let unique = session.unique_tiles().unwrap();
    assert_eq!(
        unique.assignment()[&GridCoord::new(1, 0)],
        GridCoord::new(0, 0)
    );
    assert_eq!(
        unique.assignment()[&GridCoord::new(2, 0)],
        GridCoord::new(2, 0)
    );
}

#[tokio::test]
async fn test_classification_lands_in_grid() {
    let black = [0, 0, 0, 255];
    let blue = [0, 0, 255, 255];
    let image = solid_cells(&[&[black, blue], &[BASE, black]], 14);

    let mut registry = TypeRegistry::new();
    registry.register(Rule::center_colour("0", Rgb::new(0, 0, 0), TileType::unexplored()));
    registry.register(Rule::center_colour("water", Rgb::new(0, 0, 255), TileType::water()));
    registry.register(Rule::new(
        "broken",
        Matcher::predicate(|_| Err("no data".to_string())),
        TileType::new("x", "broken", TileCategory::Land),
    ));

    let mut session = MapSession::new(
        SessionConfig {
            tile_width: 14,
            tile_height: 14,
            ..SessionConfig::default()
        },
        registry,
    );
    session.load_image(image);
    let report = session.analyze().await.unwrap();

    assert_eq!(report.classification.total, 4);
    assert_eq!(report.classification.classified, 3);
    assert_eq!(report.classification.to_string(), "3 of 4 tiles classified (1 rule failures)");

    let grid = session.grid().unwrap();
    assert!(grid.get_tile(0, 0).unwrap().tile_type.is_unexplored());
    assert_eq!(grid.get_tile(1, 0).unwrap().tile_type, TileType::water());
    assert_eq!(grid.get_tile(0, 1).unwrap(), grid.default_tile().clone());
    assert_eq!(grid.non_default_tiles().len(), 3);
    assert!(matches!(
        grid.get_tile(2, 0),
        Err(TileError::OutOfBounds { col: 2, row: 0 })
    ));

    let neighbours: Vec<GridCoord> = grid
        .neighbors(0, 0)
        .unwrap()
        .into_iter()
        .map(|n| n.coord)
        .collect();
    assert_eq!(neighbours, vec![GridCoord::new(1, 0), GridCoord::new(0, 1)]);
}

#[tokio::test]
async fn test_analyze_then_export() {
    let image = solid_cells(&[&[BASE, [0, 0, 0, 255], BASE]], 14);
    let mut session = session_14();
    session.load_image(image);
    session.analyze().await.unwrap();

    let dir = tempdir().unwrap();
    let index = export_unique_tiles(session.unique_tiles().unwrap(), (14, 14), dir.path()).unwrap();
    assert_eq!(index.unique.len(), 2);

    let reread = read_index(&dir.path().join("tiles.json")).unwrap();
    assert_eq!(reread, index);
    assert_eq!(reread.assignment[&GridCoord::new(2, 0)], 0);
}
