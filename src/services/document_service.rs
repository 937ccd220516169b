// src/services/document_service.rs

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClientRepository, PaymentRepository},
    models::{
        auth::{AccessScope, User},
        payment::PaymentType,
    },
};

/// Tudo o que vai impresso no recibo.
#[derive(Debug, Clone)]
pub struct ReceiptData {
    pub company_name: String,
    pub payment_id: Uuid,
    pub client_name: String,
    pub payment_number: i32,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub issued_by: String,
}

impl ReceiptData {
    /// Conteúdo do QR Code: referência verificável do recibo.
    pub fn reference(&self) -> String {
        format!(
            "RECIBO|{}|{}|{:.2}|{}",
            self.payment_id,
            self.payment_number,
            self.amount,
            self.completed_at.format("%Y-%m-%d")
        )
    }

    fn installment_label(&self) -> String {
        match self.payment_type {
            PaymentType::First => "Entrada".to_string(),
            PaymentType::Monthly => format!("Parcela {}", self.payment_number),
            PaymentType::Deposit => "Sinal".to_string(),
            PaymentType::Additional => "Pagamento adicional".to_string(),
        }
    }
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

/// Monta o PDF em memória. Precisa da família "Roboto" em `fonts_dir`.
pub fn render_receipt(data: &ReceiptData, fonts_dir: &str) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(format!("Fonte não encontrada na pasta {}", fonts_dir)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Recibo {}", data.payment_id));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(
        elements::Paragraph::new(data.company_name.clone())
            .styled(style::Style::new().bold().with_font_size(18)),
    );
    doc.push(elements::Break::new(1.5));
    doc.push(
        elements::Paragraph::new("RECIBO DE PAGAMENTO")
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    doc.push(elements::Paragraph::new(format!("Cliente: {}", data.client_name)));
    doc.push(elements::Break::new(1));

    // --- DETALHES ---
    let mut table = elements::TableLayout::new(vec![2, 3]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    let style_bold = style::Style::new().bold();
    let rows = [
        ("Referente a", data.installment_label()),
        ("Vencimento", data.due_date.format("%d/%m/%Y").to_string()),
        ("Pago em", data.completed_at.format("%d/%m/%Y").to_string()),
        ("Valor", format!("R$ {:.2}", data.amount)),
    ];
    for (label, value) in rows {
        table
            .row()
            .element(elements::Paragraph::new(label).styled(style_bold))
            .element(elements::Paragraph::new(value))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- QR CODE ---
    let code = QrCode::new(data.reference().as_bytes()).map_err(pdf_error)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
    let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
        .map_err(pdf_error)?
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(pdf_image);

    // --- RODAPÉ ---
    doc.push(elements::Break::new(1));
    doc.push(
        elements::Paragraph::new(format!("Emitido por {} · Ref. {}", data.issued_by, data.payment_id))
            .styled(style::Style::new().italic().with_font_size(8)),
    );

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

#[derive(Clone)]
pub struct DocumentService {
    clients: ClientRepository,
    payments: PaymentRepository,
    company_name: String,
    fonts_dir: PathBuf,
    pool: PgPool,
}

impl DocumentService {
    pub fn new(
        clients: ClientRepository,
        payments: PaymentRepository,
        company_name: String,
        fonts_dir: PathBuf,
        pool: PgPool,
    ) -> Self {
        Self { clients, payments, company_name, fonts_dir, pool }
    }

    pub async fn generate_receipt_pdf(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Vec<u8>, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let client = self
            .clients
            .find_by_id(&self.pool, client_id, filter)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        let payment = self
            .payments
            .find_by_id(&self.pool, client_id, payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)?;

        let completed_at = match (payment.is_completed, payment.completed_at) {
            (true, Some(at)) => at,
            _ => return Err(AppError::PaymentNotCompleted),
        };

        let data = ReceiptData {
            company_name: self.company_name.clone(),
            payment_id: payment.id,
            client_name: client.full_name,
            payment_number: payment.payment_number,
            payment_type: payment.payment_type,
            amount: payment.effective_amount(),
            due_date: payment.due_date,
            completed_at,
            issued_by: user.full_name.clone(),
        };

        // Renderização é CPU-bound
        let fonts_dir = self.fonts_dir.to_string_lossy().into_owned();
        let pdf = tokio::task::spawn_blocking(move || render_receipt(&data, &fonts_dir))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de geração do PDF: {}", e))??;

        tracing::info!("🧾 Recibo da parcela {} gerado ({} bytes)", payment_id, pdf.len());
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn data() -> ReceiptData {
        ReceiptData {
            company_name: "Escritório".into(),
            payment_id: Uuid::nil(),
            client_name: "João".into(),
            payment_number: 3,
            payment_type: PaymentType::Monthly,
            amount: dec!(10000),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            completed_at: Utc.with_ymd_and_hms(2024, 4, 14, 9, 0, 0).unwrap(),
            issued_by: "Ana".into(),
        }
    }

    #[test]
    fn reference_encodes_payment_and_amount() {
        assert_eq!(
            data().reference(),
            "RECIBO|00000000-0000-0000-0000-000000000000|3|10000.00|2024-04-14"
        );
    }

    #[test]
    fn labels_follow_payment_type() {
        let mut d = data();
        assert_eq!(d.installment_label(), "Parcela 3");
        d.payment_type = PaymentType::First;
        assert_eq!(d.installment_label(), "Entrada");
    }

    #[test]
    fn missing_fonts_are_reported() {
        let result = render_receipt(&data(), "./nao-existe");
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}
