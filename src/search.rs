/// Mock web search backed by a static table of known companies.
///
/// Result richness depends on how specific the query is:
/// - vague queries get news only, a bad source and a hint
/// - targeted queries (earnings, revenue, ...) add financials and events
/// - sector-specific queries add bonus insights and drop the bad source

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTier {
    Vague,
    Targeted,
    Sector,
}

pub struct MockCompany {
    pub key: &'static str,
    pub sector: &'static str,
    pub news: &'static [&'static str],
    pub financials: &'static [&'static str],
    pub events: &'static [&'static str],
    pub sources_good: &'static [&'static str],
    pub sources_bad: &'static [&'static str],
    pub bonus: &'static [&'static str],
    pub keywords_targeted: &'static [&'static str],
    pub keywords_sector: &'static [&'static str],
}

pub const MOCK_COMPANIES: &[MockCompany] = &[
    MockCompany {
        key: "apple",
        sector: "Technology",
        news: &[
            "Apple reports Q1 2026 revenue of $124.3B, beating estimates by 4% (Jan 30, 2026)",
            "Apple Intelligence rollout expands to 15 new languages across EU markets (Feb 3, 2026)",
            "Apple Vision Pro 2 rumored for WWDC 2026 with M4 chip and lighter design (Feb 10, 2026)",
            "Apple acquires UK-based AI startup for $200M to bolster on-device ML (Jan 22, 2026)",
        ],
        financials: &[
            "Q1 2026 revenue: $124.3B (+8% YoY)",
            "Services revenue: $26.3B (+14% YoY), new all-time high",
            "Gross margin: 46.9%, up from 45.9% year-ago quarter",
            "iPhone revenue: $71.4B (+6% YoY), driven by iPhone 16 Pro demand",
        ],
        events: &[
            "Expanded Apple Intelligence to EU with on-device processing focus",
            "Opened new R&D center in Munich focused on wireless chip design",
            "Announced $110B share buyback program, largest in corporate history",
        ],
        sources_good: &[
            "https://investor.apple.com/quarterly-results/2026-q1",
            "https://www.reuters.com/technology/apple-q1-2026-earnings",
            "https://www.bloomberg.com/news/apple-intelligence-eu-expansion",
        ],
        sources_bad: &["not-a-valid-url"],
        bonus: &[
            "R&D spending: $7.8B in Q1 2026, up 11% YoY",
            "App Store developer payouts exceeded $100B cumulative in 2025",
        ],
        keywords_targeted: &["earnings", "quarterly", "revenue", "financial"],
        keywords_sector: &["AI strategy", "product launch", "R&D spending"],
    },
    MockCompany {
        key: "tesla",
        sector: "Automotive / Energy",
        news: &[
            "Tesla delivers 495,000 vehicles in Q4 2025, missing estimates by 3% (Jan 5, 2026)",
            "Tesla Semi begins volume production at Giga Nevada (Jan 18, 2026)",
            "Elon Musk confirms FSD v13 achieving 99.99% intervention-free miles (Feb 7, 2026)",
            "Tesla Energy division posts $3.2B quarterly revenue, up 67% YoY (Jan 29, 2026)",
        ],
        financials: &[
            "Q4 2025 revenue: $27.1B (+12% YoY)",
            "Automotive gross margin: 18.2%, recovering from 2024 lows",
            "Energy generation and storage revenue: $3.2B (+67% YoY)",
            "Free cash flow: $2.8B, driven by energy storage deployments",
        ],
        events: &[
            "Robotaxi pilot program launched in Austin, TX with 200 vehicles",
            "Optimus humanoid robot demo at shareholder meeting: walking and sorting tasks",
            "Giga Mexico construction resumed after regulatory approval",
        ],
        sources_good: &[
            "https://ir.tesla.com/quarterly-results/2025-q4",
            "https://www.reuters.com/business/autos/tesla-q4-deliveries",
            "https://www.bloomberg.com/news/tesla-semi-volume-production",
        ],
        sources_bad: &["htp://electrek.co/broken-link"],
        bonus: &[
            "Supercharger network: 65,000+ stalls globally, up 30% YoY",
            "Tesla Insurance now available in 14 states",
        ],
        keywords_targeted: &["earnings", "quarterly", "revenue", "delivery", "deliveries"],
        keywords_sector: &["production capacity", "delivery numbers", "regulatory"],
    },
    MockCompany {
        key: "nvidia",
        sector: "Technology / Semiconductors",
        news: &[
            "Nvidia reports Q4 FY2026 revenue of $44.2B, data center up 85% YoY (Feb 12, 2026)",
            "Nvidia announces Blackwell Ultra B300 GPU at GTC 2026 (Feb 5, 2026)",
            "Nvidia partners with Saudi Arabia's NEOM for $5B AI infrastructure deal (Jan 25, 2026)",
            "US tightens AI chip export controls; Nvidia expects $1.5B revenue impact (Feb 1, 2026)",
        ],
        financials: &[
            "Q4 FY2026 revenue: $44.2B (+65% YoY)",
            "Data center revenue: $39.1B (+85% YoY)",
            "Gross margin: 73.8%, slight compression from Blackwell ramp costs",
            "Full FY2026 revenue: $158B, surpassing all analyst estimates",
        ],
        events: &[
            "Blackwell Ultra B300 announced with 2x inference throughput vs B200",
            "Expanded sovereign AI partnerships: Saudi Arabia, UAE, India, France",
            "Jensen Huang keynote at GTC 2026 on 'physical AI' and the robotics roadmap",
        ],
        sources_good: &[
            "https://investor.nvidia.com/quarterly-results/fy2026-q4",
            "https://www.reuters.com/technology/nvidia-q4-fy2026-earnings",
            "https://www.bloomberg.com/news/nvidia-blackwell-ultra-announcement",
        ],
        sources_bad: &["www.cnbc.com/nvidia-export-controls"],
        bonus: &[
            "CUDA developer ecosystem: 5M+ developers worldwide",
            "Nvidia DGX Cloud partnerships with AWS, Azure, and GCP",
        ],
        keywords_targeted: &["earnings", "quarterly", "revenue", "data center"],
        keywords_sector: &["GPU announcement", "chip export", "data center revenue"],
    },
];

pub fn find_company(query: &str) -> Option<&'static MockCompany> {
    let lower = query.to_lowercase();
    MOCK_COMPANIES
        .iter()
        .find(|company| lower.contains(company.key))
}

pub fn query_tier(query: &str, company: &MockCompany) -> QueryTier {
    let lower = query.to_lowercase();
    if company
        .keywords_sector
        .iter()
        .any(|kw| lower.contains(&kw.to_lowercase()))
    {
        return QueryTier::Sector;
    }
    if company
        .keywords_targeted
        .iter()
        .any(|kw| lower.contains(&kw.to_lowercase()))
    {
        return QueryTier::Targeted;
    }
    QueryTier::Vague
}

/// Run a mock search and render a multi-section text report.
pub fn web_search(query: &str) -> String {
    let Some(company) = find_company(query) else {
        return format!("No results found for: {query}");
    };
    let tier = query_tier(query, company);
    let detailed = matches!(tier, QueryTier::Targeted | QueryTier::Sector);

    let mut lines = Vec::new();
    lines.push(format!("=== Recent News for {} ===", title_case(company.key)));
    push_bullets(&mut lines, company.news);

    if detailed {
        lines.push("\n=== Financial Highlights ===".to_string());
        push_bullets(&mut lines, company.financials);
        lines.push("\n=== Key Events ===".to_string());
        push_bullets(&mut lines, company.events);
    }

    if tier == QueryTier::Sector {
        lines.push("\n=== Additional Insights ===".to_string());
        push_bullets(&mut lines, company.bonus);
    }

    lines.push("\n=== Sources ===".to_string());
    push_bullets(&mut lines, company.sources_good);
    if tier != QueryTier::Sector {
        push_bullets(&mut lines, company.sources_bad);
    }

    if tier == QueryTier::Vague {
        lines.push(
            "\nLimited results. Try a more specific query \
             (e.g., include 'quarterly earnings', 'revenue', or sector-specific terms)."
                .to_string(),
        );
    }

    tracing::debug!(query = %query, company = company.key, tier = ?tier, "mock search served");
    lines.join("\n")
}

fn push_bullets(lines: &mut Vec<String>, items: &[&str]) {
    lines.extend(items.iter().map(|item| format!("- {item}")));
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
