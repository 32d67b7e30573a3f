//! HTML rendering
//!
//! Each block type maps to exactly one rendering routine. Every routine
//! receives the global [`StyleSettings`] so colors and fonts stay consistent
//! across the whole email; a block only deviates when it defines its own
//! override field (e.g. `backgroundColor` on hero and cta blocks).

use email_model::{
    ArticleBlock, BlockDocument, ContentBlock, CtaBlock, EcommerceBlock, FeaturesBlock,
    FooterBlock, GalleryBlock, HeadingBlock, HeroBlock, ListBlock, PricingBlock, SemanticBlock,
    StatsBlock, StyleSettings, TestimonialBlock,
};

/// Escape text for use in HTML element content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a value for use inside a double-quoted attribute
pub fn escape_attr(value: &str) -> String {
    escape_html(value)
}

/// Render a full HTML email. Block order is preserved exactly.
pub fn render_html(document: &BlockDocument) -> String {
    let settings = &document.settings;
    let body: String = document
        .blocks
        .iter()
        .map(|block| render_block(block, settings))
        .collect();

    let preview = document
        .preview_text
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| {
            format!(
                r#"  <div style="display: none; max-height: 0; overflow: hidden;">{}</div>
"#,
                escape_html(p)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; background-color: {background}; font-family: {font}; color: {text};">
{preview}  <table role="presentation" width="100%" cellpadding="0" cellspacing="0" border="0">
    <tr>
      <td align="center">
        <table role="presentation" width="{width}" cellpadding="0" cellspacing="0" border="0" style="max-width: {width}px; width: 100%; background-color: #ffffff;">
{body}        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        background = escape_attr(&settings.background_color),
        font = escape_attr(&settings.font_family),
        text = escape_attr(&settings.text_color),
        width = settings.max_width,
        preview = preview,
        body = body,
    )
}

/// Render a single block as a table row
pub fn render_block(block: &SemanticBlock, settings: &StyleSettings) -> String {
    let inner = match block {
        SemanticBlock::Hero(b) => render_hero(b, settings),
        SemanticBlock::Features(b) => render_features(b, settings),
        SemanticBlock::Cta(b) => render_cta(b, settings),
        SemanticBlock::Footer(b) => render_footer(b, settings),
        SemanticBlock::Testimonial(b) => render_testimonial(b, settings),
        SemanticBlock::Stats(b) => render_stats(b, settings),
        SemanticBlock::Pricing(b) => render_pricing(b, settings),
        SemanticBlock::Article(b) => render_article(b, settings),
        SemanticBlock::List(b) => render_list(b, settings),
        SemanticBlock::Gallery(b) => render_gallery(b, settings),
        SemanticBlock::Ecommerce(b) => render_ecommerce(b, settings),
        SemanticBlock::Content(b) => render_content(b, settings),
        SemanticBlock::Heading(b) => render_heading(b, settings),
    };
    format!(
        "          <tr><td data-block=\"{}\">{}</td></tr>\n",
        block.block_type(),
        inner
    )
}

fn button(text: &str, url: &str, settings: &StyleSettings) -> String {
    format!(
        r#"<a href="{url}" style="display: inline-block; background-color: {color}; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; font-family: {font};">{text}</a>"#,
        url = escape_attr(url),
        color = escape_attr(&settings.primary_color),
        font = escape_attr(&settings.font_family),
        text = escape_html(text),
    )
}

fn section_title(title: &str, settings: &StyleSettings) -> String {
    format!(
        r#"<h2 style="margin: 0 0 16px 0; font-size: 22px; color: {color}; font-family: {font};">{title}</h2>"#,
        color = escape_attr(&settings.text_color),
        font = escape_attr(&settings.font_family),
        title = escape_html(title),
    )
}

fn paragraph(text: &str, settings: &StyleSettings) -> String {
    format!(
        r#"<p style="margin: 0 0 12px 0; font-size: 16px; line-height: 1.5; color: {color}; font-family: {font};">{text}</p>"#,
        color = escape_attr(settings.secondary_or_text()),
        font = escape_attr(&settings.font_family),
        text = escape_html(text),
    )
}

fn image(url: &str, alt: &str, width: u32) -> String {
    format!(
        r#"<img src="{url}" alt="{alt}" width="{width}" style="display: block; max-width: 100%; height: auto; border: 0;">"#,
        url = escape_attr(url),
        alt = escape_attr(alt),
        width = width,
    )
}

fn padded(content: String, background: Option<&str>) -> String {
    match background {
        Some(color) => format!(
            r#"<div style="padding: 32px 24px; background-color: {};">{}</div>"#,
            escape_attr(color),
            content
        ),
        None => format!(r#"<div style="padding: 24px;">{}</div>"#, content),
    }
}

fn render_hero(block: &HeroBlock, settings: &StyleSettings) -> String {
    let mut content = String::new();
    if let Some(url) = &block.image_url {
        content.push_str(&image(url, &block.headline, settings.max_width.saturating_sub(48)));
    }
    content.push_str(&format!(
        r#"<h1 style="margin: 16px 0 12px 0; font-size: 32px; line-height: 1.2; color: {color}; font-family: {font};">{headline}</h1>"#,
        color = escape_attr(&settings.text_color),
        font = escape_attr(&settings.font_family),
        headline = escape_html(&block.headline),
    ));
    if let Some(sub) = &block.subheadline {
        content.push_str(&paragraph(sub, settings));
    }
    content.push_str(&format!(
        r#"<div style="margin-top: 24px;">{}</div>"#,
        button(&block.cta_text, &block.cta_url, settings)
    ));
    padded(content, block.background_color.as_deref())
}

fn render_features(block: &FeaturesBlock, settings: &StyleSettings) -> String {
    let mut content = section_title(&block.title, settings);
    for feature in &block.features {
        let icon = feature
            .icon
            .as_deref()
            .map(|i| format!("{} ", escape_html(i)))
            .unwrap_or_default();
        content.push_str(&format!(
            r#"<h3 style="margin: 16px 0 4px 0; font-size: 18px; color: {color};">{icon}{title}</h3>"#,
            color = escape_attr(&settings.primary_color),
            icon = icon,
            title = escape_html(&feature.title),
        ));
        content.push_str(&paragraph(&feature.description, settings));
    }
    padded(content, None)
}

fn render_cta(block: &CtaBlock, settings: &StyleSettings) -> String {
    let mut content = section_title(&block.headline, settings);
    if let Some(description) = &block.description {
        content.push_str(&paragraph(description, settings));
    }
    content.push_str(&button(&block.button_text, &block.button_url, settings));
    padded(
        format!(r#"<div style="text-align: center;">{}</div>"#, content),
        block.background_color.as_deref(),
    )
}

fn render_footer(block: &FooterBlock, settings: &StyleSettings) -> String {
    let muted = escape_attr(settings.secondary_or_text());
    let mut content = format!(
        r#"<p style="margin: 0 0 8px 0; font-size: 12px; color: {muted};">{name}</p>"#,
        muted = muted,
        name = escape_html(&block.company_name),
    );
    if let Some(address) = &block.address {
        content.push_str(&format!(
            r#"<p style="margin: 0 0 8px 0; font-size: 12px; color: {muted};">{address}</p>"#,
            muted = muted,
            address = escape_html(address),
        ));
    }
    if !block.social_links.is_empty() {
        let links: Vec<String> = block
            .social_links
            .iter()
            .map(|link| {
                format!(
                    r#"<a href="{}" style="color: {}; margin: 0 6px;">{}</a>"#,
                    escape_attr(&link.url),
                    muted,
                    escape_html(&link.platform)
                )
            })
            .collect();
        content.push_str(&format!(
            r#"<p style="margin: 0 0 8px 0; font-size: 12px;">{}</p>"#,
            links.join("")
        ));
    }
    content.push_str(&format!(
        r#"<p style="margin: 0; font-size: 12px;"><a href="{url}" style="color: {muted};">Unsubscribe</a></p>"#,
        url = escape_attr(&block.unsubscribe_url),
        muted = muted,
    ));
    padded(
        format!(r#"<div style="text-align: center;">{}</div>"#, content),
        None,
    )
}

fn render_testimonial(block: &TestimonialBlock, settings: &StyleSettings) -> String {
    let mut content = String::new();
    if let Some(avatar) = &block.avatar_url {
        content.push_str(&image(avatar, &block.author, 64));
    }
    content.push_str(&format!(
        r#"<blockquote style="margin: 12px 0; padding-left: 16px; border-left: 4px solid {color}; font-size: 18px; font-style: italic;">{quote}</blockquote>"#,
        color = escape_attr(&settings.primary_color),
        quote = escape_html(&block.quote),
    ));
    let attribution = match &block.role {
        Some(role) => format!("{}, {}", block.author, role),
        None => block.author.clone(),
    };
    content.push_str(&paragraph(&attribution, settings));
    padded(content, None)
}

fn render_stats(block: &StatsBlock, settings: &StyleSettings) -> String {
    let mut content = block
        .title
        .as_deref()
        .map(|t| section_title(t, settings))
        .unwrap_or_default();
    let cells: Vec<String> = block
        .stats
        .iter()
        .map(|stat| {
            format!(
                r#"<td align="center" style="padding: 8px;"><div style="font-size: 28px; font-weight: 700; color: {color};">{value}</div><div style="font-size: 14px;">{label}</div></td>"#,
                color = escape_attr(&settings.primary_color),
                value = escape_html(&stat.value),
                label = escape_html(&stat.label),
            )
        })
        .collect();
    content.push_str(&format!(
        r#"<table role="presentation" width="100%"><tr>{}</tr></table>"#,
        cells.join("")
    ));
    padded(content, None)
}

fn render_pricing(block: &PricingBlock, settings: &StyleSettings) -> String {
    let mut content = block
        .title
        .as_deref()
        .map(|t| section_title(t, settings))
        .unwrap_or_default();
    for plan in &block.plans {
        let period = plan
            .period
            .as_deref()
            .map(|p| format!(" / {}", escape_html(p)))
            .unwrap_or_default();
        let features: String = plan
            .features
            .iter()
            .map(|f| format!("<li>{}</li>", escape_html(f)))
            .collect();
        content.push_str(&format!(
            r#"<div style="border: 1px solid {border}; border-radius: 8px; padding: 16px; margin-bottom: 16px;"><h3 style="margin: 0;">{name}</h3><div style="font-size: 24px; font-weight: 700; color: {color};">{price}{period}</div><ul>{features}</ul>{button}</div>"#,
            border = escape_attr(settings.secondary_or_text()),
            name = escape_html(&plan.name),
            color = escape_attr(&settings.primary_color),
            price = escape_html(&plan.price),
            period = period,
            features = features,
            button = button(&plan.cta_text, &plan.cta_url, settings),
        ));
    }
    padded(content, None)
}

fn render_article(block: &ArticleBlock, settings: &StyleSettings) -> String {
    let mut content = String::new();
    if let Some(url) = &block.image_url {
        content.push_str(&image(url, &block.title, settings.max_width.saturating_sub(48)));
    }
    content.push_str(&section_title(&block.title, settings));
    if let Some(author) = &block.author {
        content.push_str(&paragraph(&format!("By {}", author), settings));
    }
    content.push_str(&paragraph(&block.excerpt, settings));
    content.push_str(&format!(
        r#"<a href="{url}" style="color: {color}; font-weight: 600;">Read more</a>"#,
        url = escape_attr(&block.url),
        color = escape_attr(&settings.primary_color),
    ));
    padded(content, None)
}

fn render_list(block: &ListBlock, settings: &StyleSettings) -> String {
    let items: String = block
        .items
        .iter()
        .map(|item| format!(r#"<li style="margin-bottom: 8px;">{}</li>"#, escape_html(item)))
        .collect();
    padded(
        format!(
            r#"{}<ul style="padding-left: 20px; font-size: 16px; line-height: 1.5;">{}</ul>"#,
            section_title(&block.title, settings),
            items
        ),
        None,
    )
}

fn render_gallery(block: &GalleryBlock, settings: &StyleSettings) -> String {
    let mut content = block
        .title
        .as_deref()
        .map(|t| section_title(t, settings))
        .unwrap_or_default();
    let columns = block.images.len().clamp(1, 3) as u32;
    let cell_width = settings.max_width.saturating_sub(48) / columns;
    let cells: Vec<String> = block
        .images
        .iter()
        .map(|img| {
            format!(
                r#"<td style="padding: 4px;">{}</td>"#,
                image(&img.url, &img.alt, cell_width)
            )
        })
        .collect();
    content.push_str(&format!(
        r#"<table role="presentation" width="100%"><tr>{}</tr></table>"#,
        cells.join("")
    ));
    padded(content, None)
}

fn render_ecommerce(block: &EcommerceBlock, settings: &StyleSettings) -> String {
    let mut content = block
        .title
        .as_deref()
        .map(|t| section_title(t, settings))
        .unwrap_or_default();
    for product in &block.products {
        content.push_str(&format!(
            r#"<div style="margin-bottom: 24px;">{image}<h3 style="margin: 8px 0 4px 0;">{name}</h3><div style="font-size: 18px; color: {color};">{price}</div><div style="margin-top: 8px;">{button}</div></div>"#,
            image = image(&product.image_url, &product.name, 200),
            name = escape_html(&product.name),
            color = escape_attr(&settings.primary_color),
            price = escape_html(&product.price),
            button = button("Shop now", &product.url, settings),
        ));
    }
    padded(content, None)
}

fn render_content(block: &ContentBlock, settings: &StyleSettings) -> String {
    let mut content = block
        .heading
        .as_deref()
        .map(|h| section_title(h, settings))
        .unwrap_or_default();
    for p in &block.paragraphs {
        content.push_str(&paragraph(p, settings));
    }
    padded(content, None)
}

fn render_heading(block: &HeadingBlock, settings: &StyleSettings) -> String {
    let level = block.level.unwrap_or(2).clamp(1, 6);
    let size = match level {
        1 => 32,
        2 => 24,
        3 => 20,
        _ => 18,
    };
    padded(
        format!(
            r#"<h{level} style="margin: 0; font-size: {size}px; color: {color}; font-family: {font};">{text}</h{level}>"#,
            level = level,
            size = size,
            color = escape_attr(&settings.text_color),
            font = escape_attr(&settings.font_family),
            text = escape_html(&block.text),
        ),
        None,
    )
}
