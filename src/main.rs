use anyhow::Context;
use bolao::admin;
use bolao::checkout::{self, PaymentEvent};
use bolao::engine::scoring::{leaderboard, reconcile_bets, score_ticket, TieBreak};
use bolao::engine::standings::live_standings;
use bolao::state::settings::AppSettings;
use bolao_store::PoolStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        println!("{}", usage_text());
        return Ok(());
    };

    match command.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            return Ok(());
        }
        "-V" | "--version" => {
            println!("bolao {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let settings = AppSettings::load()?;
    let store = PoolStore::new(settings.store_url, settings.store_key);

    match command.as_str() {
        "standings" => print_standings(&store).await,
        "score" => {
            let ticket_id = args.next().context("usage: bolao score <ticket-id>")?;
            print_score(&store, &ticket_id).await
        }
        "leaderboard" => {
            let tie_break = match args.next().as_deref() {
                Some("--by-cpf") => TieBreak::BettorId,
                _ => TieBreak::EarliestSubmission,
            };
            print_leaderboard(&store, tie_break).await
        }
        "generate-semis" => {
            let inserted = admin::generate_semifinals(&store).await?;
            for m in &inserted {
                println!("{}  {}", m.start_time, describe(m));
            }
            Ok(())
        }
        "generate-final" => {
            let inserted = admin::generate_final(&store).await?;
            for m in &inserted {
                println!("{}  {}", m.start_time, describe(m));
            }
            Ok(())
        }
        "activate" => {
            let payment_ref = args.next().context("usage: bolao activate <payment-ref>")?;
            let event = PaymentEvent::OrderPaid { payment_ref };
            match checkout::apply_payment_event(&store, &event).await? {
                Some(ticket) => println!("ticket {} is now {}", ticket.id, ticket.status.as_str()),
                None => println!("no ticket matches that payment reference"),
            }
            Ok(())
        }
        "refund" => {
            let ticket_id = args.next().context("usage: bolao refund <ticket-id>")?;
            let ticket = checkout::refund_ticket(&store, &ticket_id).await?;
            println!("ticket {} is now {}", ticket.id, ticket.status.as_str());
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "bolao - bracket pool engine CLI

Usage:
  bolao standings                Live group tables from finished results
  bolao score <ticket-id>        Hits for one ticket
  bolao leaderboard [--by-cpf]   Ranking of active tickets
  bolao generate-semis           Insert the two SEMI matches (admin)
  bolao generate-final           Insert the FINAL match (admin)
  bolao activate <payment-ref>   Apply a payment confirmation
  bolao refund <ticket-id>       Mark a ticket refunded

Environment:
  BOLAO_STORE_URL   PostgREST endpoint of the pool backend
  BOLAO_STORE_KEY   API key for the backend
  RUST_LOG          Log filter (e.g. debug)"
}

fn describe(m: &bolao_store::Match) -> String {
    let name = |t: &Option<bolao_store::Team>| {
        t.as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "TBD".to_owned())
    };
    format!("{} x {}", name(&m.team_a), name(&m.team_b))
}

async fn print_standings(store: &PoolStore) -> anyhow::Result<()> {
    let teams = store.teams().await?;
    let matches = store.matches().await?;
    for group in ["A", "B"] {
        println!("Group {group}");
        let table = live_standings(group, &teams, &matches)?;
        for (pos, row) in table.iter().enumerate() {
            println!(
                "  {}. {:<24} {:>2} pts  gd {:+}  gf {}",
                pos + 1,
                row.team.name,
                row.points,
                row.goal_diff,
                row.goals_for
            );
        }
    }
    Ok(())
}

async fn print_score(store: &PoolStore, ticket_id: &str) -> anyhow::Result<()> {
    let ticket = store
        .get_ticket_by_id(ticket_id)
        .await?
        .with_context(|| format!("ticket {ticket_id} not found"))?;
    let matches = store.matches().await?;
    let bets = reconcile_bets(&ticket.bets, &matches);
    let score = score_ticket(&bets, &matches);
    println!(
        "ticket {} ({}): {}/{} hits",
        ticket.id,
        ticket.status.as_str(),
        score.hits,
        score.max
    );
    Ok(())
}

async fn print_leaderboard(store: &PoolStore, tie_break: TieBreak) -> anyhow::Result<()> {
    let tickets = store.active_tickets().await?;
    let matches = store.matches().await?;
    let board = leaderboard(&tickets, &matches, tie_break);
    if board.is_empty() {
        println!("no active tickets yet");
        return Ok(());
    }
    for (pos, entry) in board.iter().enumerate() {
        println!(
            "  {}. {:<14} {}/{} hits  (ticket {})",
            pos + 1,
            entry.cpf,
            entry.hits,
            entry.max,
            entry.ticket_id
        );
    }
    Ok(())
}
