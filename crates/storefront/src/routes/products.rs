//! Product route handlers.
//!
//! The selection lives in the query string. A request whose query does not
//! name a purchasable state is redirected to the canonical one, so every
//! rendered view corresponds to a concrete variant, core choice and delivery
//! choice.

use axum::{
    Form, Json,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use reman_core::resolver::{OptionState, option_matrix};
use reman_core::selection::{CORE_VARIANT_ID_KEY, DELIVERY_OPTION_KEY};
use reman_core::{
    CoreChargeOption, CurrencyCode, DeliveryChoice, DeliveryRates, OptimisticSelection, Price,
    PriceSummary, Product, ProductId, Resolution, SelectionState, Variant, compute_total,
    core_charge_options, plan_lines, resolve, resolve_or_default,
};

use crate::error::{Result, add_breadcrumb};
use crate::routes::cart::{get_cart_id, set_cart_id};
use crate::shopify::types::{Cart, CartLineInput};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Product fields shown above the selector.
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub available_for_sale: bool,
    pub tags: Vec<String>,
}

/// A delivery destination with its surcharge.
#[derive(Debug, Serialize)]
pub struct DeliveryOptionView {
    pub value: &'static str,
    pub surcharge: Price,
    pub selected: bool,
}

/// Everything the product detail page renders.
#[derive(Debug, Serialize)]
pub struct ProductPageView {
    pub product: ProductSummary,
    pub variant: Option<Variant>,
    /// Lowest price among purchasable variants.
    pub from_price: Option<Price>,
    pub selection: SelectionState,
    pub options: Vec<OptionState>,
    pub core_charge_options: Vec<CoreChargeOption>,
    pub delivery_options: Vec<DeliveryOptionView>,
    pub price: PriceSummary,
    pub show_selector: bool,
}

impl ProductPageView {
    fn build(
        product: &Product,
        variant: Option<&Variant>,
        selection: SelectionState,
        rates: &DeliveryRates,
    ) -> Self {
        let from_price = product.min_available_price();
        let default_price = from_price.unwrap_or_else(|| Price::zero(CurrencyCode::default()));
        let currency = variant.map_or(default_price.currency_code, |v| v.price.currency_code);
        let core_choice = selection.core_choice();
        let delivery_choice = selection.delivery_choice();

        let delivery_options = DeliveryChoice::ALL
            .into_iter()
            .map(|choice| DeliveryOptionView {
                value: choice.as_str(),
                surcharge: Price::new(rates.surcharge(choice), currency),
                selected: delivery_choice == Some(choice),
            })
            .collect();

        Self {
            product: ProductSummary {
                id: product.id.clone(),
                handle: product.handle.clone(),
                title: product.title.clone(),
                description: product.description.clone(),
                available_for_sale: product.available_for_sale,
                tags: product.tags.clone(),
            },
            variant: variant.cloned(),
            from_price,
            options: option_matrix(product, &selection),
            core_charge_options: variant.map(core_charge_options).unwrap_or_default(),
            delivery_options,
            price: compute_total(
                variant,
                core_choice.as_ref(),
                delivery_choice,
                rates,
                default_price,
            ),
            show_selector: product.has_real_choice(),
            selection,
        }
    }
}

// =============================================================================
// Selection Helpers
// =============================================================================

/// Fill in whatever the selection leaves open.
///
/// A selection matching no variant takes the default variant's options. A
/// missing core choice takes the variant's first core-charge option, and a
/// missing delivery choice becomes Commercial.
fn canonical_selection(product: &Product, state: &SelectionState) -> SelectionState {
    let mut filled = state.clone();
    let resolution = resolve_or_default(product, state);
    if let Resolution::Defaulted(variant) = resolution {
        filled.select_variant(variant);
    }

    if let Some(variant) = resolution.variant()
        && !filled.contains(CORE_VARIANT_ID_KEY)
        && let Some(first) = core_charge_options(variant).into_iter().next()
    {
        filled.set(CORE_VARIANT_ID_KEY, first.value);
    }

    if !filled.contains(DELIVERY_OPTION_KEY) {
        filled.set(DELIVERY_OPTION_KEY, DeliveryChoice::Commercial.as_str());
    }

    filled
}

/// Whether an update picks an option value rather than a reserved choice.
fn changes_options(update: &SelectionState) -> bool {
    update
        .iter()
        .any(|(key, _)| key != CORE_VARIANT_ID_KEY && key != DELIVERY_OPTION_KEY)
}

fn product_path(handle: &str) -> String {
    format!("/product/{handle}")
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a product with the selection from the query string.
///
/// Redirects to the canonical query when the selection is incomplete.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    let query = query.unwrap_or_default();
    let confirmed = SelectionState::from_query(&query, &product.options);

    let canonical = canonical_selection(&product, &confirmed);
    if canonical != confirmed {
        let mut selection = OptimisticSelection::new(confirmed);
        selection.apply(&canonical);
        let location = selection.commit(&query).location(&product_path(&handle));
        tracing::debug!(%location, "Filling selection defaults");
        return Ok(Redirect::to(&location).into_response());
    }

    let variant = resolve(&product, &canonical);
    let view = ProductPageView::build(
        &product,
        variant,
        canonical,
        &state.config().store_prefix.delivery_rates(),
    );
    Ok(Json(view).into_response())
}

/// Apply option changes over the current selection.
///
/// The form carries the changed keys only. Picking a new option value resets
/// the core choice to the first one the resulting variant offers.
#[instrument(skip(state, query, form))]
pub async fn update_options(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    RawQuery(query): RawQuery,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Redirect> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    let query = query.unwrap_or_default();
    let confirmed = SelectionState::from_query(&query, &product.options);
    let update = SelectionState::decode(form, &product.options);

    let mut selection = OptimisticSelection::new(confirmed);
    let view = selection.apply(&update).clone();

    if changes_options(&update) && !update.contains(CORE_VARIANT_ID_KEY) {
        let core = resolve(&product, &view)
            .and_then(|variant| core_charge_options(variant).into_iter().next());
        if let Some(core) = core {
            selection.apply(&[(CORE_VARIANT_ID_KEY, core.value)].into_iter().collect());
        }
    }

    let location = selection.commit(&query).location(&product_path(&handle));
    Ok(Redirect::to(&location))
}

/// Add the current selection to the cart.
///
/// Creates a cart on first use and remembers it in the session.
#[instrument(skip(state, session, query))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Path(handle): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Cart>> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    let selection = SelectionState::from_query(&query.unwrap_or_default(), &product.options);

    let lines: Vec<CartLineInput> = plan_lines(resolve(&product, &selection), &selection)?
        .into_iter()
        .map(CartLineInput::from)
        .collect();

    let cart = match get_cart_id(&session).await {
        Some(cart_id) => state.storefront().add_to_cart(&cart_id, lines).await?,
        None => state.storefront().create_cart(lines).await?,
    };
    set_cart_id(&session, &cart.id).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("handle", handle.as_str()), ("cart_id", cart.id.as_str())]),
    );
    tracing::info!(cart_id = %cart.id, quantity = cart.total_quantity, "Added to cart");
    Ok(Json(cart))
}
