use proptest::prelude::*;
use workload_grid::{
    CellRef, CellValue, Grid, HeatmapPalette, LabelledGrid, OriginPoint, Range, ValueMatrix,
};

#[derive(Debug, Clone)]
struct Sheet {
    origin: OriginPoint,
    grid: Grid,
    values: ValueMatrix,
}

fn build(
    header_rows: u32,
    header_cols: u32,
    x_labels: Vec<Vec<String>>,
    y_labels: Vec<Vec<String>>,
    reference: Vec<Vec<i32>>,
    values: Vec<Vec<i32>>,
    merge: Option<((u32, u32), (u32, u32))>,
) -> Sheet {
    let mut grid = Grid::new("prop");
    for (level, labels) in x_labels.iter().enumerate() {
        for (j, label) in labels.iter().enumerate() {
            grid.set_value(CellRef::new(level as u32, header_cols + j as u32), label.as_str());
        }
    }
    for (level, labels) in y_labels.iter().enumerate() {
        for (i, label) in labels.iter().enumerate() {
            grid.set_value(CellRef::new(header_rows + i as u32, level as u32), label.as_str());
        }
    }
    for (i, row) in reference.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            grid.set_value(
                CellRef::new(header_rows + i as u32, header_cols + j as u32),
                f64::from(*v),
            );
        }
    }
    if let Some((a, b)) = merge {
        let corner = |(r, c): (u32, u32)| CellRef::new(header_rows + r, header_cols + c);
        grid.merge_range(Range::new(corner(a), corner(b)))
            .expect("single merge inside the value region");
    }
    let values = values
        .into_iter()
        .map(|row| row.into_iter().map(f64::from).collect())
        .collect();
    Sheet {
        origin: OriginPoint::new(header_rows, header_cols),
        grid,
        values: ValueMatrix::from_rows(values).expect("rectangular"),
    }
}

fn sheet() -> impl Strategy<Value = Sheet> {
    (1u32..3, 1u32..3, 1usize..5, 1usize..5).prop_flat_map(|(hr, hc, rows, cols)| {
        let labels = |n: usize, levels: u32| {
            prop::collection::vec(prop::collection::vec("[ab]", n), levels as usize)
        };
        let numbers = move || {
            prop::collection::vec(prop::collection::vec(-50i32..50, cols), rows)
        };
        let corner = move || (0..rows as u32, 0..cols as u32);
        (
            (Just(hr), Just(hc)),
            labels(cols, hr),
            labels(rows, hc),
            numbers(),
            numbers(),
            prop::option::of((corner(), corner())),
        )
            .prop_map(|((hr, hc), x, y, reference, values, merge)| {
                build(hr, hc, x, y, reference, values, merge)
            })
    })
}

fn numeric_total(grid: &Grid) -> f64 {
    (0..grid.row_count())
        .flat_map(|r| (0..grid.col_count()).map(move |c| CellRef::new(r, c)))
        .filter_map(|cell| match grid.value(cell) {
            CellValue::Number(n) => Some(*n),
            _ => None,
        })
        .sum()
}

proptest! {
    #[test]
    fn header_levels_span_the_value_region(sheet in sheet()) {
        let labelled = LabelledGrid::new(&sheet.grid, sheet.origin).unwrap();
        let (rows, cols) = labelled.value_shape();
        prop_assert_eq!(labelled.x_levels().len(), sheet.origin.header_rows as usize);
        prop_assert_eq!(labelled.y_levels().len(), sheet.origin.header_cols as usize);
        for level in labelled.x_levels() {
            prop_assert_eq!(level.len(), cols);
        }
        for level in labelled.y_levels() {
            prop_assert_eq!(level.len(), rows);
        }
    }

    #[test]
    fn render_then_reread_recovers_the_matrix(sheet in sheet(), heatmap in any::<bool>()) {
        let labelled = LabelledGrid::new(&sheet.grid, sheet.origin).unwrap();
        let palette = HeatmapPalette::default();
        let rendered = labelled
            .render_matrix(&sheet.values, heatmap.then_some(&palette))
            .unwrap();
        let reread = LabelledGrid::new(&rendered, sheet.origin).unwrap();
        let (rows, cols) = reread.value_shape();
        prop_assert_eq!((rows, cols), sheet.values.shape());
        for i in 0..rows {
            for j in 0..cols {
                prop_assert_eq!(reread.reference_value(i, j), Some(sheet.values.get(i, j)));
            }
        }
    }

    #[test]
    fn downmix_conserves_the_total(
        sheet in sheet(),
        collapse_x in any::<bool>(),
        collapse_y in any::<bool>(),
    ) {
        let labelled = LabelledGrid::new(&sheet.grid, sheet.origin).unwrap();
        let out = labelled
            .render_downmixed(
                &sheet.values,
                collapse_x.then_some(1),
                collapse_y.then_some(1),
                None,
            )
            .unwrap();
        prop_assert_eq!(numeric_total(&out), sheet.values.sum());
    }

    #[test]
    fn wildcard_coordinates_match_every_cell(sheet in sheet()) {
        let labelled = LabelledGrid::new(&sheet.grid, sheet.origin).unwrap();
        let (rows, cols) = labelled.value_shape();
        let result = labelled.locate_cell::<&str, &str>(&[None], &[None]);
        if rows * cols == 1 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }
}
