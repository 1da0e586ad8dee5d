//! Checkout Link Post-Processing
//!
//! Finds the checkout URL in an assistant reply and renders it as a
//! scannable QR code.

use std::io::Cursor;
use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use regex::Regex;

use crate::error::{PaymentError, Result};

/// Smallest edge of a rendered code, in pixels
pub const QR_MIN_SIZE: u32 = 240;

static CHECKOUT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://(?:checkout|buy)\.stripe\.com/[\w./-]+")
        .unwrap_or_else(|e| panic!("invalid checkout link pattern: {e}"))
});

/// First checkout URL in `text`, without trailing sentence punctuation
pub fn extract_link(text: &str) -> Option<String> {
    let found = CHECKOUT_LINK.find(text)?;
    Some(found.as_str().trim_end_matches('.').to_owned())
}

/// PNG bytes of a QR code encoding exactly `url`
pub fn render_qr(url: &str) -> Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M)
        .map_err(|e| PaymentError::Render(e.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PaymentError::Render(e.to_string()))?;
    Ok(png)
}

/// `data:` URL of the QR code, for inline `<img>` tags
pub fn qr_data_url(url: &str) -> Result<String> {
    render_qr(url).map(|png| format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> String {
        let img = image::load_from_memory(png).unwrap().to_luma8();
        let (width, height) = img.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            usize::try_from(width).unwrap(),
            usize::try_from(height).unwrap(),
            |x, y| {
                img.get_pixel(u32::try_from(x).unwrap(), u32::try_from(y).unwrap())
                    .0[0]
            },
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);
        grids[0].decode().unwrap().1
    }

    #[test]
    fn test_finds_link_and_drops_sentence_period() {
        let reply = "Done! Your link: https://checkout.stripe.com/c/pay/plink_mock_1. Share it.";
        assert_eq!(
            extract_link(reply).as_deref(),
            Some("https://checkout.stripe.com/c/pay/plink_mock_1")
        );
        assert_eq!(
            extract_link("Pay at https://buy.stripe.com/test_6oE9E4aB3").as_deref(),
            Some("https://buy.stripe.com/test_6oE9E4aB3")
        );
    }

    #[test]
    fn test_first_match_only() {
        let reply = "https://checkout.stripe.com/a and https://checkout.stripe.com/b";
        assert_eq!(extract_link(reply).as_deref(), Some("https://checkout.stripe.com/a"));
    }

    #[test]
    fn test_no_link_is_none() {
        assert_eq!(extract_link("I created the product prod_123."), None);
        assert_eq!(extract_link("https://example.com/checkout"), None);
        assert_eq!(extract_link("http://checkout.stripe.com/insecure"), None);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "Link (https://checkout.stripe.com/c/pay/cs_test_a1-b2) ready";
        let once = extract_link(text).unwrap();
        assert_eq!(once, "https://checkout.stripe.com/c/pay/cs_test_a1-b2");
        assert_eq!(extract_link(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn test_qr_decodes_to_same_url() {
        let url = "https://checkout.stripe.com/c/pay/plink_mock_1";
        let first = render_qr(url).unwrap();
        let second = render_qr(url).unwrap();

        assert_eq!(decode(&first), url);
        assert_eq!(decode(&second), url);

        let (width, height) = image::load_from_memory(&first).unwrap().to_luma8().dimensions();
        assert!(width >= QR_MIN_SIZE && height >= QR_MIN_SIZE);
    }

    #[test]
    fn test_data_url_is_base64_png() {
        let data = qr_data_url("https://buy.stripe.com/x").unwrap();
        assert!(data.starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_oversized_payload_fails_to_render() {
        let url = format!("https://checkout.stripe.com/{}", "a".repeat(4000));
        assert!(matches!(render_qr(&url), Err(PaymentError::Render(_))));
    }
}
