//! Partial status update applied by administrators.

use crate::error::DomainError;

use super::{OrderStatus, PaymentStatus};

/// Fields an administrator may change on a placed order. Absent fields are
/// left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_number: Option<String>,
}

impl OrderPatch {
    /// Builds a patch from raw request values, validating each supplied field
    /// with the same rules used at creation.
    ///
    /// A blank tracking number counts as absent.
    pub fn parse(
        order_status: Option<&str>,
        payment_status: Option<&str>,
        tracking_number: Option<String>,
    ) -> Result<Self, DomainError> {
        let patch = Self {
            order_status: order_status.map(str::parse).transpose()?,
            payment_status: payment_status.map(str::parse).transpose()?,
            tracking_number: tracking_number
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        };

        if patch.is_empty() {
            return Err(DomainError::EmptyPatch);
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.order_status.is_none() && self.payment_status.is_none() && self.tracking_number.is_none()
    }
}
