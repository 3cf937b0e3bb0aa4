use serde_json::Value;
use tower_sessions::Session;

use crate::{
    cart::{CartAction, CartLine, CartState},
    checkout::{CheckoutDraft, ShippingForm, ShippingInfo},
    dto::{
        checkout::{ReviewSummary, ShippingStep},
        orders::OrderConfirmation,
        payment::LineRequest,
    },
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, session::keys},
    payment::ProviderOrder,
    pricing::OrderTotals,
    response::{ApiResponse, Meta},
    services::{cart_service::CartStore, payment_service},
    state::AppState,
};

async fn load_draft(session: &Session) -> AppResult<CheckoutDraft> {
    let Some(raw) = session.get::<Value>(keys::CHECKOUT).await? else {
        return Ok(CheckoutDraft::default());
    };
    match serde_json::from_value(raw) {
        Ok(draft) => Ok(draft),
        Err(err) => {
            tracing::warn!(error = %err, "discarding malformed checkout draft");
            session.remove::<Value>(keys::CHECKOUT).await?;
            Ok(CheckoutDraft::default())
        }
    }
}

async fn save_draft(session: &Session, draft: &CheckoutDraft) -> AppResult<()> {
    session.insert(keys::CHECKOUT, draft).await?;
    Ok(())
}

fn require_items(cart: &CartState) -> AppResult<()> {
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    Ok(())
}

fn line_requests(lines: &[CartLine]) -> Vec<LineRequest> {
    lines
        .iter()
        .map(|line| LineRequest {
            id: line.id,
            quantity: line.quantity,
        })
        .collect()
}

fn review_summary(draft: &CheckoutDraft, shipping: &ShippingInfo, cart: &CartState) -> ReviewSummary {
    ReviewSummary {
        step: draft.step,
        shipping: shipping.clone(),
        items: cart.items().to_vec(),
        totals: OrderTotals::new(cart.subtotal(), shipping.shipping_method),
    }
}

/// Step 1. On success the draft moves to review and the summary is returned.
pub async fn submit_shipping(
    state: &AppState,
    session: Session,
    form: ShippingForm,
) -> AppResult<ApiResponse<ReviewSummary>> {
    let mut draft = load_draft(&session).await?;
    let cart = CartStore::load(session.clone(), &state.orm).await?;
    require_items(cart.state())?;

    let shipping = draft
        .submit_shipping(&form)
        .map_err(AppError::Validation)?
        .clone();
    save_draft(&session, &draft).await?;

    let summary = review_summary(&draft, &shipping, cart.state());
    Ok(ApiResponse::success("Review your order", summary, Some(Meta::empty())))
}

/// Step 2.
pub async fn review(state: &AppState, session: Session) -> AppResult<ApiResponse<ReviewSummary>> {
    let draft = load_draft(&session).await?;
    let shipping = draft.reviewed_shipping()?;
    let cart = CartStore::load(session.clone(), &state.orm).await?;
    require_items(cart.state())?;

    let summary = review_summary(&draft, shipping, cart.state());
    Ok(ApiResponse::success("Review your order", summary, Some(Meta::empty())))
}

pub async fn edit(session: Session) -> AppResult<ApiResponse<ShippingStep>> {
    let mut draft = load_draft(&session).await?;
    draft.edit();
    save_draft(&session, &draft).await?;
    Ok(ApiResponse::success(
        "Editing shipping details",
        ShippingStep {
            step: draft.step,
            shipping: draft.shipping,
        },
        None,
    ))
}

/// Step 3: opens the provider order for the current cart and remembers its
/// id together with the lines it covers.
pub async fn start_payment(
    state: &AppState,
    session: Session,
) -> AppResult<ApiResponse<ProviderOrder>> {
    let mut draft = load_draft(&session).await?;
    let method = draft.reviewed_shipping()?.shipping_method;
    let cart = CartStore::load(session.clone(), &state.orm).await?;
    require_items(cart.state())?;

    let lines = cart.state().lines();
    let resp = payment_service::create_order(state, &line_requests(&lines), method).await?;
    if let Some(order) = resp.data.as_ref() {
        draft.begin_payment(order.id.clone(), lines)?;
        save_draft(&session, &draft).await?;
    }
    Ok(resp)
}

/// Captures the approved provider order for the lines it was opened with,
/// then removes those lines from the cart and drops the draft. Items added
/// to the cart after payment started stay in the cart.
pub async fn complete(
    state: &AppState,
    session: Session,
    user: Option<&AuthUser>,
    provider_order_id: &str,
) -> AppResult<ApiResponse<OrderConfirmation>> {
    let draft = load_draft(&session).await?;
    let pending = draft.pending_payment(provider_order_id)?;
    let shipping = pending.shipping.clone();
    let paid = pending.lines.to_vec();

    let resp = payment_service::capture_payment(
        state,
        provider_order_id,
        &shipping,
        &line_requests(&paid),
        user,
    )
    .await?;

    let mut cart = CartStore::load(session.clone(), &state.orm).await?;
    for line in &paid {
        cart.dispatch(CartAction::RemoveItem(line.id)).await?;
    }
    session.remove::<Value>(keys::CHECKOUT).await?;
    tracing::info!(%provider_order_id, "checkout completed");
    Ok(resp)
}
