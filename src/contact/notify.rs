use super::Contact;
use chrono::NaiveDateTime;

fn or_placeholder<'a>(value: &'a str, placeholder: &'static str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

/// Subject and body of the message sent to the site owner.
pub fn admin_notification(
    contact: &Contact,
    reference_id: i64,
    now: NaiveDateTime,
) -> (String, String) {
    let subject = format!(
        "New Contact Form Submission - {} (#{})",
        contact.subject, reference_id
    );
    let body = format!(
        "New contact form submission received:

Reference ID: {reference_id}
Date: {date}

Contact Information:
- Name: {first} {last}
- Email: {email}
- Phone: {phone}
- Company: {company}

Inquiry Details:
- Subject: {subject}
- Image: {image}
- Newsletter: {newsletter}

Message:
{message}

---
This is an automated message from your website contact form.
",
        date = now.format("%Y-%m-%d %H:%M:%S"),
        first = contact.first_name,
        last = contact.last_name,
        email = contact.email,
        phone = or_placeholder(&contact.phone, "Not provided"),
        company = or_placeholder(&contact.company, "Not provided"),
        subject = contact.subject,
        image = or_placeholder(&contact.image, "Not specified"),
        newsletter = if contact.news_letter { "Yes" } else { "No" },
        message = contact.message,
    );
    (subject, body)
}

/// Subject and body of the acknowledgement sent to the visitor.
pub fn visitor_confirmation(
    contact: &Contact,
    app_title: &str,
    now: NaiveDateTime,
) -> (String, String) {
    let preview = crate::text::truncate_with_ellipsis(&contact.message, 200);
    let body = format!(
        "Dear {first},

Thank you for reaching out to us. We have received your message regarding \"{subject}\" and will respond within 24 hours during business days.

Here's a summary of your inquiry:
- Subject: {subject}
- Message: {preview}

If you need to reference this inquiry, please mention that you submitted it on {date}.

Best regards,
Your {app_title} Team

---
This is an automated confirmation email. Please do not reply to this message.
",
        first = contact.first_name,
        subject = contact.subject,
        date = now.format("%Y-%m-%d"),
    );
    ("Thank you for contacting us".to_string(), body)
}
