use confseal_core::{FilePair, PairState};

use crate::app::AppContext;
use crate::cli::OutputArgs;
use crate::ui::theme::{pair_state_style, styled};
use crate::ui::{badge, header, hint, print, table, Badge, Column, UiContext};

const COLUMNS: [Column; 4] = [
    Column::new("NAME"),
    Column::new("PLAINTEXT"),
    Column::new("SEALED"),
    Column::new("STATE"),
];

pub fn handle_status(ctx: &AppContext, args: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(args.json);
    let layout = ctx.layout()?;
    let pairs = layout.pairs()?;

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }

    let dir = layout.dir().display().to_string();
    if !ctx.quiet() {
        print(&ui, &header(&ui, "status", Some(&dir)));
    }
    if pairs.is_empty() {
        print(
            &ui,
            &badge(&ui, Badge::Info, &format!("No config files in {}", dir)),
        );
        return Ok(());
    }

    let rows: Vec<Vec<String>> = pairs.iter().map(|pair| status_row(&ui, pair)).collect();
    print(&ui, &table(&ui, &COLUMNS, &rows));

    if !ctx.quiet() && ui.mode.is_pretty() {
        for line in follow_up_hints(&pairs) {
            print(&ui, &hint(&ui, &line));
        }
    }
    Ok(())
}

fn status_row(ui: &UiContext, pair: &FilePair) -> Vec<String> {
    let present = |exists: bool| if exists { "yes" } else { "-" }.to_string();
    let state = if ui.mode.is_pretty() {
        styled(pair.state.label(), pair_state_style(pair.state), ui.color)
    } else {
        pair.state.label().replace(' ', "_")
    };
    vec![
        pair.name.clone(),
        present(pair.plaintext.is_some()),
        present(pair.ciphertext.is_some()),
        state,
    ]
}

/// Next steps suggested by the pair states.
fn follow_up_hints(pairs: &[FilePair]) -> Vec<String> {
    let count = |wanted: &[PairState]| {
        pairs
            .iter()
            .filter(|pair| wanted.contains(&pair.state))
            .count()
    };
    let mut hints = Vec::new();

    let unsealed = count(&[PairState::Stale, PairState::PlaintextOnly]);
    if unsealed > 0 {
        hints.push(format!(
            "Run `confseal encrypt` to seal {} changed file{}.",
            unsealed,
            if unsealed == 1 { "" } else { "s" }
        ));
    }
    let missing = count(&[PairState::CiphertextOnly]);
    if missing > 0 {
        hints.push(format!(
            "Run `confseal decrypt` to restore {} file{}.",
            missing,
            if missing == 1 { "" } else { "s" }
        ));
    }
    hints
}
