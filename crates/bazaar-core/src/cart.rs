//! # Cart
//!
//! The mutable shopping cart that the pricing pipeline aggregates.
//!
//! ## Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Invariants                                   │
//! │                                                                         │
//! │  • Lines are unique by product_id - adding the same product again     │
//! │    increments the existing line's quantity, never duplicates it        │
//! │  • Quantity driven to 0 removes the line                               │
//! │  • Unit price is frozen at the moment the product is added             │
//! │  • At most ONE coupon - applying a second replaces the first           │
//! │  • Totals are never stored; they are recomputed from items + coupon    │
//! │    by the pricing pipeline on every read                               │
//! │  • Caps: 100 unique lines, 999 units per line                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Like everything in this crate, the cart never reads the wall clock -
//! callers pass `now` where a timestamp is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Coupon;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the shopping cart.
///
/// ## Price Freezing
/// `unit_price_cents` is captured when the product is added. If the product
/// price changes afterwards, this line retains the original price; the
/// order snapshot created at checkout inherits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product ID (UUID)
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Price in cents at time of adding (frozen)
    pub unit_price_cents: i64,

    /// Quantity in cart (always >= 1)
    pub quantity: i64,

    /// When this line was first added
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Calculates the line total (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line total as Money.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart: lines plus at most one applied coupon snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in the cart
    pub items: Vec<CartItem>,

    /// The applied coupon, if any. Replaced wholesale by `apply_coupon`.
    pub coupon: Option<Coupon>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            coupon: None,
        }
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// ## Behavior
    /// - If product already in cart: increments the line's quantity
    /// - If product not in cart: appends a new line with the price frozen
    ///
    /// ## Errors
    /// - [`CoreError::QuantityTooLarge`] if the line would exceed 999 units
    /// - [`CoreError::CartTooLarge`] if a new line would exceed 100 lines
    /// - [`CoreError::Validation`] if `quantity < 1`
    pub fn add_item(
        &mut self,
        product_id: &str,
        name: &str,
        unit_price_cents: i64,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;
        crate::validation::validate_price_cents(unit_price_cents)?;

        // Merge into an existing line first
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem {
            product_id: product_id.to_string(),
            name: name.to_string(),
            unit_price_cents,
            quantity,
            added_at: now,
        });
        Ok(())
    }

    /// Updates the quantity of a line.
    ///
    /// ## Behavior
    /// - Quantity 0 removes the line
    /// - Product not found is an error
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        crate::validation::validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            Ok(())
        } else {
            Err(CoreError::ItemNotInCart(product_id.to_string()))
        }
    }

    /// Removes a line by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ItemNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Applies a coupon snapshot to the cart.
    ///
    /// At most one coupon is active per cart; applying a second REPLACES
    /// the first, never stacks. Returns the replaced coupon, if any.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Option<Coupon> {
        self.coupon.replace(coupon)
    }

    /// Removes the applied coupon, returning it if one was set.
    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.coupon.take()
    }

    /// Clears all lines and the coupon (checkout completion or explicit
    /// clear).
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
    }

    /// Returns the number of unique lines in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Calculates the subtotal (before discount, tax, shipping).
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_cents()).sum()
    }

    /// Subtotal as Money.
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents())
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
