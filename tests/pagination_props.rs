//! Property tests for report pagination: whatever the content, no body block
//! crosses the printable bottom and every page gets exactly one footer.

mod common;

use credibility_report::pdf::render_report;
use credibility_report::{BlockKind, Comment, CommentMap, MatrixDefinition, source_cell_id, source_id};
use proptest::prelude::*;

const FIXED_CELLS: &[&str] = &[
    "L1-001.1", "L1-001.2", "L1-001.3", "L1-001.4", "L1-001.5", "L1-001.6", "L1-002.1",
    "L1-002.2", "L1-002.3", "L1-002.4", "L2-003.1", "L2-003.2", "L2-003.3", "L2-003.4",
    "L2-003.5",
];

fn comment_strategy() -> impl Strategy<Value = Comment> {
    (
        "[a-z ]{0,40}",
        proptest::collection::vec("[a-zA-Z]{1,12}", 0..300),
        proptest::option::of(0u8..=5),
        0usize..3,
    )
        .prop_map(|(title, words, rating, images)| Comment {
            title,
            content: words.join(" "),
            images: (0..images)
                .map(|i| common::png_attachment(&format!("img{i}.png"), 40 + 300 * i as u32, 60))
                .collect(),
            rating,
        })
}

fn state_strategy() -> impl Strategy<Value = (CommentMap, usize)> {
    (
        proptest::collection::vec((0..FIXED_CELLS.len() + 8, comment_strategy()), 0..14),
        0usize..3,
    )
        .prop_map(|(entries, source_count)| {
            let mut comments = CommentMap::new();
            for (slot, comment) in entries {
                let key = match FIXED_CELLS.get(slot) {
                    Some(cell) => cell.to_string(),
                    None => {
                        let extra = slot - FIXED_CELLS.len();
                        source_cell_id(&source_id(extra / 4 + 1), extra % 4 + 1)
                    }
                };
                comments.insert(key, comment);
            }
            (comments, source_count)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn blocks_stay_inside_printable_area((comments, source_count) in state_strategy(), with_title in any::<bool>()) {
        let sources = (1..=source_count).map(|n| common::source(n, "Outlet")).collect();
        let mut ctx = common::context(comments, sources);
        if with_title {
            ctx.title = Some("Property run".into());
            ctx.author = Some("Tester".into());
        }
        let report = render_report(&ctx, &MatrixDefinition::default()).unwrap();

        common::assert_within_printable_area(&report);
        let footers: Vec<usize> = report.blocks_of(BlockKind::Footer).map(|b| b.page).collect();
        prop_assert_eq!(footers, (0..report.page_count).collect::<Vec<_>>());

        // Blocks are placed in reading order.
        for pair in report.blocks.windows(2) {
            if pair[0].kind.is_body() && pair[1].kind.is_body() && pair[0].page == pair[1].page
                && pair[0].kind != BlockKind::Chart && pair[1].kind != BlockKind::Chart
                && pair[0].kind != BlockKind::ImageCaption && pair[1].kind != BlockKind::ImageCaption
            {
                prop_assert!(pair[0].top <= pair[1].top);
            }
            prop_assert!(pair[0].page <= pair[1].page || pair[1].kind == BlockKind::Footer);
        }
    }
}
