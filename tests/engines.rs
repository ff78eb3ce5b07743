use gol_bench::{engine, Backend, GridState, StepEngine};

const SEED: u64 = 42;
const FILL_RATE: f64 = 0.3;

/// Every backend that can be built here; an unavailable accelerator is skipped.
fn engines(width: usize, height: usize) -> Vec<Box<dyn StepEngine>> {
    Backend::ALL
        .into_iter()
        .filter_map(|backend| match engine::create(backend, width, height) {
            Ok(engine) => Some(engine),
            Err(e) if e.is_backend_unavailable() => {
                eprintln!("skipping {}: {}", backend, e);
                None
            }
            Err(e) => panic!("cannot create {} engine: {}", backend, e),
        })
        .collect()
}

fn assert_fields_equal(expected: &GridState, actual: &GridState, backend: Backend) {
    assert_eq!(expected.dimensions(), actual.dimensions());
    if expected.same_cells(actual) {
        return;
    }
    const K: usize = 10;
    let (w, h) = expected.dimensions();
    let i = expected
        .cells()
        .iter()
        .zip(actual.cells())
        .position(|(a, b)| a != b)
        .unwrap();
    let (x, y) = (i % w, i / w);
    let (x1, y1) = (x.saturating_sub(K), y.saturating_sub(K));
    let (x2, y2) = ((x + K).min(w), (y + K).min(h));
    let mut picture = String::new();
    for y in y1..y2 {
        for grid in [expected, actual] {
            picture.push('|');
            picture.extend((x1..x2).map(|x| if grid.get(x, y) == 0 { ' ' } else { '#' }));
        }
        picture.push_str("|\n");
    }
    panic!(
        "{} differs from the scalar reference at ({}, {}):\n{}",
        backend, x, y, picture
    );
}

fn check_all_backends(grid: &GridState, steps: usize) {
    let (w, h) = grid.dimensions();
    let mut reference = engine::create(Backend::Scalar, w, h).unwrap();
    let expected = reference.advance(grid.clone(), steps).unwrap();
    for mut engine in engines(w, h) {
        let single = engine.step(grid).unwrap();
        let first = reference.step(grid).unwrap();
        assert_fields_equal(&first, &single, engine.backend());

        let batched = engine.advance(grid.clone(), steps).unwrap();
        assert_fields_equal(&expected, &batched, engine.backend());
        assert_eq!(batched.generation(), steps as u64);
    }
}

#[test]
fn test_backends_agree_on_random_fields() {
    for (w, h) in [(1, 1), (2, 3), (3, 2), (7, 5), (64, 64), (100, 37)] {
        for (i, fill_rate) in [0.1, FILL_RATE, 0.6].into_iter().enumerate() {
            let grid = GridState::create(w, h, fill_rate, Some(SEED + i as u64)).unwrap();
            check_all_backends(&grid, 1);
            check_all_backends(&grid, 17);
        }
    }
}

#[test]
fn test_backends_agree_on_literal_fields() {
    let grid = GridState::from_pattern(&[
        [0, 1, 0, 0, 0, 0, 1],
        [0, 0, 1, 0, 0, 0, 1],
        [1, 1, 1, 0, 0, 0, 1],
        [0, 0, 0, 0, 1, 1, 0],
        [1, 0, 0, 0, 1, 1, 0],
    ])
    .unwrap();
    check_all_backends(&grid, 1);
    check_all_backends(&grid, 9);
}

#[test]
fn test_single_cell_neighbours_wrap() {
    const N: isize = 6;
    let mut grid = GridState::blank(N as usize, N as usize).unwrap();
    grid.set(0, 0, true);
    let wrapped = [
        (N - 1, N - 1),
        (N - 1, 0),
        (N - 1, 1),
        (0, N - 1),
        (0, 1),
        (1, N - 1),
        (1, 0),
        (1, 1),
    ];
    for (x, y) in wrapped {
        let neighbours = (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&d| d != (0, 0))
            .map(|(dx, dy)| grid.at(x + dx, y + dy) as usize)
            .sum::<usize>();
        assert_eq!(neighbours, 1, "cell ({}, {}) should see (0, 0)", x, y);
    }

    // a lone cell dies everywhere, including across both seams
    for mut engine in engines(N as usize, N as usize) {
        assert_eq!(engine.step(&grid).unwrap().population(), 0);
    }
}

#[test]
fn test_births_across_both_seams() {
    const N: usize = 8;
    // three corners of a block split over the four corners of the torus
    let mut grid = GridState::blank(N, N).unwrap();
    grid.set(N - 1, N - 1, true);
    grid.set(0, N - 1, true);
    grid.set(N - 1, 0, true);
    let mut block = grid.clone();
    block.set(0, 0, true);

    // a blinker lying over the vertical seam turns into one over the horizontal seam
    let mut blinker = GridState::blank(N, N).unwrap();
    for x in [N - 1, 0, 1] {
        blinker.set(x, 3, true);
    }
    let mut turned = GridState::blank(N, N).unwrap();
    for y in [2, 3, 4] {
        turned.set(0, y, true);
    }
    let mut vertical = GridState::blank(N, N).unwrap();
    for y in [N - 1, 0, 1] {
        vertical.set(3, y, true);
    }
    let mut horizontal = GridState::blank(N, N).unwrap();
    for x in [2, 3, 4] {
        horizontal.set(x, 0, true);
    }

    for mut engine in engines(N, N) {
        let backend = engine.backend();
        assert_fields_equal(&block, &engine.step(&grid).unwrap(), backend);
        assert_fields_equal(&turned, &engine.step(&blinker).unwrap(), backend);
        assert_fields_equal(&horizontal, &engine.step(&vertical).unwrap(), backend);
    }
}

#[test]
fn test_blinker_has_period_two() {
    let grid = GridState::from_pattern(&[
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [0, 1, 1, 1, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
    ])
    .unwrap();
    let vertical = GridState::from_pattern(&[
        [0, 0, 0, 0, 0, 0],
        [0, 0, 1, 0, 0, 0],
        [0, 0, 1, 0, 0, 0],
        [0, 0, 1, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
    ])
    .unwrap();
    for mut engine in engines(6, 6) {
        let backend = engine.backend();
        let mut curr = grid.clone();
        for generation in 1..=6 {
            curr = engine.step(&curr).unwrap();
            let expected = if generation % 2 == 1 { &vertical } else { &grid };
            assert_fields_equal(expected, &curr, backend);
        }
        assert_eq!(curr.generation(), 6);
    }
}

#[test]
fn test_block_is_still_life() {
    let grid = GridState::from_pattern(&[
        [0, 0, 0, 0],
        [0, 1, 1, 0],
        [0, 1, 1, 0],
        [0, 0, 0, 0],
    ])
    .unwrap();
    for mut engine in engines(4, 4) {
        let next = engine.step(&grid).unwrap();
        assert_fields_equal(&grid, &next, engine.backend());
        let later = engine.advance(next, 10).unwrap();
        assert_fields_equal(&grid, &later, engine.backend());
    }
}

#[test]
fn test_glider_returns_home() {
    // a glider moves one cell diagonally every 4 generations
    const N: usize = 8;
    let mut grid = GridState::blank(N, N).unwrap();
    for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
        grid.set(x, y, true);
    }
    for mut engine in engines(N, N) {
        let backend = engine.backend();
        let moved = engine.advance(grid.clone(), 4).unwrap();
        for y in 0..N {
            for x in 0..N {
                assert_eq!(
                    moved.get(x, y),
                    grid.at(x as isize - 1, y as isize - 1),
                    "{} at ({}, {})",
                    backend,
                    x,
                    y
                );
            }
        }
        let home = engine.advance(grid.clone(), 4 * N).unwrap();
        assert_fields_equal(&grid, &home, backend);
    }
}

#[test]
fn test_inputs_are_not_modified() {
    let grid = GridState::create(32, 20, FILL_RATE, Some(SEED)).unwrap();
    let copy = grid.clone();
    for mut engine in engines(32, 20) {
        let mut dst = GridState::blank(32, 20).unwrap();
        engine.step_into(&grid, &mut dst).unwrap();
        assert_eq!(grid, copy);
        assert_eq!(dst.generation(), 1);
    }
}
