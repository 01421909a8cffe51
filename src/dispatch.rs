//! Transaction routing: (MTI, processing code) selects one of a closed set
//! of routes, each backed by a method on the processor seam.

use anyhow::Result;
use log::{debug, warn};

use crate::iso8583::{CodecConfig, Iso8583};

/// Response code reported for a request that matches no route.
const INVALID_TRANSACTION: &str = "12";
/// Response code pre-filled for routed requests; handlers may override.
const APPROVED: &str = "00";

/// The transaction routes the switch understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRoute {
    Sale,
    InstallmentSale,
    PreAuthorization,
    PostAuthorization,
    Refund,
    PointInquiry,
    IndependentRefund,
    EndOfDay,
    SaleCancellation,
    PreAuthorizationCancellation,
    PostAuthorizationCancellation,
    RefundCancellation,
    IndependentRefundCancellation,
    SocialSecurityPayment,
    SocialSecurityPaymentCancellation,
    SocialSecurityPaymentTechnicalCancel,
    SocialSecurityPaymentCancelTechnicalCancel,
    SaleTechnicalCancel,
    PreAuthorizationTechnicalCancel,
    PostAuthorizationTechnicalCancel,
    RefundTechnicalCancel,
    IndependentRefundTechnicalCancel,
    SaleCancellationTechnicalCancel,
    PreAuthorizationCancellationTechnicalCancel,
    PostAuthorizationCancellationTechnicalCancel,
    RefundCancellationTechnicalCancel,
    IndependentRefundCancellationTechnicalCancel,
}

impl TransactionRoute {
    /// Static route table keyed by MTI and processing code.
    pub fn lookup(mti: &str, processing_code: &str) -> Option<Self> {
        use TransactionRoute::*;
        Some(match (mti, processing_code) {
            ("0200", "000000") => Sale,
            ("0200", "120000") => InstallmentSale,
            ("0100", "300000") => PreAuthorization,
            ("0220", "020000") => PostAuthorization,
            ("0200", "200000") => Refund,
            ("0200", "400000") => PointInquiry,
            ("0200", "200001") => IndependentRefund,
            ("0500", "920000") => EndOfDay,
            ("0420", "000000") => SaleCancellation,
            ("0420", "300000") => PreAuthorizationCancellation,
            ("0420", "020000") => PostAuthorizationCancellation,
            ("0420", "200000") => RefundCancellation,
            ("0420", "200001") => IndependentRefundCancellation,
            ("0200", "500000") => SocialSecurityPayment,
            ("0420", "500000") => SocialSecurityPaymentCancellation,
            ("0400", "500000") => SocialSecurityPaymentTechnicalCancel,
            ("0402", "500002") => SocialSecurityPaymentCancelTechnicalCancel,
            ("0400", "000000") => SaleTechnicalCancel,
            ("0400", "300000") => PreAuthorizationTechnicalCancel,
            ("0400", "020000") => PostAuthorizationTechnicalCancel,
            ("0402", "200002") => RefundTechnicalCancel,
            ("0402", "200003") => IndependentRefundTechnicalCancel,
            ("0402", "000002") => SaleCancellationTechnicalCancel,
            ("0402", "300002") => PreAuthorizationCancellationTechnicalCancel,
            ("0402", "020002") => PostAuthorizationCancellationTechnicalCancel,
            ("0402", "200022") => RefundCancellationTechnicalCancel,
            ("0402", "200023") => IndependentRefundCancellationTechnicalCancel,
            _ => return None,
        })
    }
}

/// Handler seam. The dispatcher pre-fills an approving response before the
/// route method runs, so the default bodies leave a well-formed answer.
#[allow(unused_variables)]
pub trait TransactionProcessor {
    fn sale(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn installment_sale(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn pre_authorization(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn post_authorization(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn refund(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn point_inquiry(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn independent_refund(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn end_of_day(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn sale_cancellation(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn pre_authorization_cancellation(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn post_authorization_cancellation(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn refund_cancellation(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn independent_refund_cancellation(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn social_security_payment(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn social_security_payment_cancellation(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn social_security_payment_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn social_security_payment_cancel_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn sale_technical_cancel(&mut self, request: &Iso8583, response: &mut Iso8583) -> Result<()> {
        Ok(())
    }
    fn pre_authorization_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn post_authorization_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn refund_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn independent_refund_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn sale_cancellation_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn pre_authorization_cancellation_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn post_authorization_cancellation_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn refund_cancellation_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
    fn independent_refund_cancellation_technical_cancel(
        &mut self,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        Ok(())
    }
}

/// Response MTI: the third digit incremented by two, clamped at 9. A
/// non-digit third character leaves the MTI unchanged.
pub fn response_mti(mti: &str) -> String {
    let mut chars: Vec<char> = mti.chars().collect();
    match chars.get(2).and_then(|c| c.to_digit(10)) {
        Some(digit) => {
            chars[2] = char::from_digit((digit + 2).min(9), 10).unwrap();
            chars.into_iter().collect()
        }
        None => mti.to_string(),
    }
}

/// Parses requests, routes them and serializes the response the processor
/// leaves behind.
pub struct Dispatcher<P> {
    processor: P,
    config: CodecConfig,
}

impl<P: TransactionProcessor> Dispatcher<P> {
    pub fn new(processor: P, config: CodecConfig) -> Self {
        Dispatcher { processor, config }
    }

    /// Handle one unframed request image and build the response image.
    pub fn handle(&mut self, raw: &[u8]) -> Result<Vec<u8>> {
        let mut request = self.config.message();
        request.from_wire(raw)?;
        debug!("incoming message: {}", request.content()?);

        let mti = request.mti().to_string();
        let processing_code = request.field(3).unwrap_or_default().to_string();

        let mut response = self.config.message();
        response.set_header(request.header());
        response.set_mti(&response_mti(&mti))?;

        match TransactionRoute::lookup(&mti, &processing_code) {
            Some(route) => {
                debug!("routing ({mti}, {processing_code}) to {route:?}");
                response.set_field(3, &processing_code)?;
                response.set_field(39, APPROVED)?;
                self.invoke(route, &request, &mut response)?;
            }
            None => {
                warn!("no route for ({mti}, {processing_code})");
                response.set_field(3, "000000")?;
                response.set_field(39, INVALID_TRANSACTION)?;
            }
        }

        Ok(response.to_wire()?)
    }

    fn invoke(
        &mut self,
        route: TransactionRoute,
        request: &Iso8583,
        response: &mut Iso8583,
    ) -> Result<()> {
        use TransactionRoute::*;
        match route {
            Sale => self.processor.sale(request, response),
            InstallmentSale => self.processor.installment_sale(request, response),
            PreAuthorization => self.processor.pre_authorization(request, response),
            PostAuthorization => self.processor.post_authorization(request, response),
            Refund => self.processor.refund(request, response),
            PointInquiry => self.processor.point_inquiry(request, response),
            IndependentRefund => self.processor.independent_refund(request, response),
            EndOfDay => self.processor.end_of_day(request, response),
            SaleCancellation => self.processor.sale_cancellation(request, response),
            PreAuthorizationCancellation => {
                self.processor.pre_authorization_cancellation(request, response)
            }
            PostAuthorizationCancellation => {
                self.processor.post_authorization_cancellation(request, response)
            }
            RefundCancellation => self.processor.refund_cancellation(request, response),
            IndependentRefundCancellation => {
                self.processor.independent_refund_cancellation(request, response)
            }
            SocialSecurityPayment => self.processor.social_security_payment(request, response),
            SocialSecurityPaymentCancellation => self
                .processor
                .social_security_payment_cancellation(request, response),
            SocialSecurityPaymentTechnicalCancel => self
                .processor
                .social_security_payment_technical_cancel(request, response),
            SocialSecurityPaymentCancelTechnicalCancel => self
                .processor
                .social_security_payment_cancel_technical_cancel(request, response),
            SaleTechnicalCancel => self.processor.sale_technical_cancel(request, response),
            PreAuthorizationTechnicalCancel => self
                .processor
                .pre_authorization_technical_cancel(request, response),
            PostAuthorizationTechnicalCancel => self
                .processor
                .post_authorization_technical_cancel(request, response),
            RefundTechnicalCancel => self.processor.refund_technical_cancel(request, response),
            IndependentRefundTechnicalCancel => self
                .processor
                .independent_refund_technical_cancel(request, response),
            SaleCancellationTechnicalCancel => self
                .processor
                .sale_cancellation_technical_cancel(request, response),
            PreAuthorizationCancellationTechnicalCancel => self
                .processor
                .pre_authorization_cancellation_technical_cancel(request, response),
            PostAuthorizationCancellationTechnicalCancel => self
                .processor
                .post_authorization_cancellation_technical_cancel(request, response),
            RefundCancellationTechnicalCancel => self
                .processor
                .refund_cancellation_technical_cancel(request, response),
            IndependentRefundCancellationTechnicalCancel => self
                .processor
                .independent_refund_cancellation_technical_cancel(request, response),
        }
    }
}
