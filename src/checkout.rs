use crate::engine::scoring::validate_bet;
use crate::engine::EngineError;
use anyhow::{bail, Context};
use bolao_store::{Bet, Match, MatchRef, NewTicket, Phase, PoolStore, Slot, Ticket, TicketStatus};
use log::{info, warn};
use std::collections::HashMap;

/// Bundle price table, in reais, as the backend stores `total_price`.
pub struct TicketPricing;

impl TicketPricing {
    pub fn bundle_price(ticket_count: usize) -> Option<f64> {
        match ticket_count {
            1 => Some(0.10),
            2 => Some(0.15),
            3 => Some(0.20),
            _ => None,
        }
    }
}

/// Callback from the payment provider. Only paid orders matter here; the
/// provider's other events carry nothing we act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    OrderPaid { payment_ref: String },
}

/// A ticket must cover every group match exactly once plus the three
/// placeholder slots, and each concrete pick must name a team actually
/// playing that match.
pub fn validate_ticket_bets(bets: &[Bet], matches: &[Match]) -> Result<(), EngineError> {
    let by_id: HashMap<&str, &Match> = matches.iter().map(|m| (m.id.as_str(), m)).collect();
    let mut missing = 0usize;

    for m in matches.iter().filter(|m| m.phase == Phase::Group) {
        let key = MatchRef::Concrete(m.id.clone());
        match bets.iter().find(|b| b.match_id == key) {
            Some(bet) => validate_bet(bet, m)?,
            None => missing += 1,
        }
    }
    for slot in [Slot::Semi1, Slot::Semi2, Slot::Final] {
        if !bets.iter().any(|b| b.match_id == MatchRef::Pending(slot)) {
            missing += 1;
        }
    }
    if missing > 0 {
        return Err(EngineError::IncompleteTicket { missing });
    }

    // Concrete picks on non-group rows (a reconciled resubmission) still get
    // the team-membership check.
    for bet in bets {
        if let MatchRef::Concrete(id) = &bet.match_id
            && let Some(m) = by_id.get(id.as_str())
        {
            validate_bet(bet, m)?;
        }
    }
    Ok(())
}

/// Persist a complete bet set as a PENDING ticket. The caller attaches the
/// payment reference once the provider order exists.
pub async fn place_ticket(
    store: &PoolStore,
    cpf: &str,
    bundle_size: usize,
    bets: Vec<Bet>,
    matches: &[Match],
) -> anyhow::Result<Ticket> {
    if store.guesses_locked().await? {
        bail!("picks are locked, checkout is closed");
    }
    let total_price = TicketPricing::bundle_price(bundle_size)
        .with_context(|| format!("no price for a bundle of {bundle_size}"))?;
    validate_ticket_bets(&bets, matches)?;

    let ticket = store
        .save_ticket(
            &NewTicket {
                cpf: cpf.to_owned(),
                status: TicketStatus::Pending,
                total_price,
            },
            &bets,
        )
        .await?;
    info!("saved pending ticket {} for {cpf}", ticket.id);
    Ok(ticket)
}

/// Promote the PENDING ticket carrying this payment reference to ACTIVE.
/// Unknown references are logged and ignored: the provider retries webhooks
/// and may ping us about orders we never created.
pub async fn apply_payment_event(
    store: &PoolStore,
    event: &PaymentEvent,
) -> anyhow::Result<Option<Ticket>> {
    let PaymentEvent::OrderPaid { payment_ref } = event;
    let Some(ticket) = store.ticket_by_payment_ref(payment_ref).await? else {
        warn!("payment confirmation for unknown reference {payment_ref}");
        return Ok(None);
    };
    if ticket.status != TicketStatus::Pending {
        info!(
            "ticket {} already {}, ignoring payment confirmation",
            ticket.id,
            ticket.status.as_str()
        );
        return Ok(Some(ticket));
    }
    store
        .set_ticket_status(&ticket.id, &TicketStatus::Active)
        .await?;
    info!("ticket {} activated by payment {payment_ref}", ticket.id);
    Ok(Some(Ticket {
        status: TicketStatus::Active,
        ..ticket
    }))
}

/// Mark a ticket REFUNDED. Moving the money back is the payment provider's
/// side of the operation.
pub async fn refund_ticket(store: &PoolStore, ticket_id: &str) -> anyhow::Result<Ticket> {
    let ticket = store
        .get_ticket_by_id(ticket_id)
        .await?
        .with_context(|| format!("ticket {ticket_id} not found"))?;
    store
        .set_ticket_status(&ticket.id, &TicketStatus::Refunded)
        .await?;
    info!("ticket {} refunded", ticket.id);
    Ok(Ticket {
        status: TicketStatus::Refunded,
        ..ticket
    })
}
