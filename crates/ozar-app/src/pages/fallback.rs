//! Sample content shown when the live tables are empty or unreachable.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use ozar_types::models::{Difficulty, Lab, LabStatus, Post, Service};

fn date(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap_or_default()
}

fn service(n: u128, title: &str, short: &str, full: &str, price: f64) -> Service {
    Service {
        id: Uuid::from_u128(n),
        title: title.into(),
        short_description: short.into(),
        full_description: full.into(),
        price,
        created_by: None,
        created_at: DateTime::default(),
    }
}

pub fn services() -> Vec<Service> {
    vec![
        service(
            1,
            "Network Configuration Labs",
            "Hands-on experience with real-world network configurations including routing, switching, and security implementations.",
            "Our Network Configuration Labs provide comprehensive hands-on experience with real-world network environments. You'll work with the latest routing protocols, switching technologies, and security implementations in a safe, sandboxed environment. Each lab includes step-by-step guides, troubleshooting scenarios, and best practice recommendations.",
            29.99,
        ),
        service(
            2,
            "Advanced Cisco Environments",
            "Practice with advanced Cisco environments designed for CCNA, CCNP, and CCIE certification preparation.",
            "Our Advanced Cisco Environments are designed to match the requirements for CCNA, CCNP, and CCIE certification exams. These labs feature authentic Cisco IOS environments and scenarios that closely mimic actual exam questions and enterprise networking challenges.",
            49.99,
        ),
        service(
            3,
            "Cloud Networking Solutions",
            "Learn how to deploy and manage network infrastructure in cloud environments including AWS, Azure, and GCP.",
            "Deploy and manage modern network infrastructure across AWS, Azure, and Google Cloud Platform: virtual network configuration, security group management, load balancing, VPN setup, and hybrid cloud connectivity.",
            39.99,
        ),
        service(
            4,
            "24/7 Lab Access",
            "Full access to all lab environments at any time of day, with unlimited usage and save states.",
            "Unrestricted access to the complete library of network laboratories whenever inspiration strikes. Work at your own pace with no time limits, and use save states to pause your work and return to it later exactly where you left off.",
            59.99,
        ),
        service(
            5,
            "Team Collaboration Labs",
            "Multi-user environments designed for team training and collaborative learning experiences.",
            "Shared networking environments where multiple users work together on complex infrastructure projects, with real-time collaboration tools, shared access controls, and instructor monitoring.",
            99.99,
        ),
        service(
            6,
            "Premium Support Package",
            "Get dedicated technical support, personalized learning plans, and expert guidance throughout your learning journey.",
            "Personalized attention from certified network engineers and instructors: one-on-one guidance, expert review of your lab work, customized learning paths, priority help desk access, and extended lab sessions.",
            79.99,
        ),
    ]
}

pub fn posts() -> Vec<Post> {
    let post = |n: u128, title: &str, short: &str, full: &str, created_at| Post {
        id: Uuid::from_u128(n),
        title: title.into(),
        short_content: short.into(),
        full_content: full.into(),
        author_id: None,
        created_at,
    };

    vec![
        post(
            1,
            "Getting Started with CCNA Certification",
            "Learn the key steps to begin your journey towards CCNA certification and set yourself up for success.",
            "The Cisco Certified Network Associate (CCNA) certification is your first step into the world of professional networking. Understand the exam objectives thoroughly, secure proper study materials, and above all get hands-on practice configuring actual network devices. Consistency is key: short, regular study sessions beat occasional cramming.",
            date(2023, 8, 15, 10, 0),
        ),
        post(
            2,
            "Network Automation Fundamentals",
            "Discover how network automation is transforming IT operations and learn the fundamental skills needed to get started.",
            "Network automation is revolutionizing how organizations manage their infrastructure. This guide covers the fundamentals you need to understand to begin implementing automation in your network environment.",
            date(2023, 9, 5, 14, 30),
        ),
        post(
            3,
            "Understanding BGP Routing",
            "An in-depth look at Border Gateway Protocol (BGP), the routing protocol that powers the internet.",
            "Border Gateway Protocol (BGP) is often called the protocol that makes the internet work. This exploration helps you understand how BGP functions and why it's so important for global connectivity.",
            date(2023, 9, 25, 9, 15),
        ),
    ]
}

pub fn labs() -> Vec<Lab> {
    let lab = |id: &str, title: &str, description: &str, difficulty, status, estimated_minutes| Lab {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        difficulty,
        status,
        estimated_minutes,
    };

    vec![
        lab(
            "lab1",
            "Introduction to Network Analysis",
            "Learn the fundamentals of network analysis and packet inspection.",
            Difficulty::Beginner,
            LabStatus::Available,
            60,
        ),
        lab(
            "lab2",
            "Advanced Vulnerability Scanning",
            "Discover and analyze network vulnerabilities through hands-on exercises.",
            Difficulty::Intermediate,
            LabStatus::Available,
            90,
        ),
        lab(
            "lab3",
            "Wireless Network Security",
            "Practical approach to securing wireless networks against common attacks.",
            Difficulty::Intermediate,
            LabStatus::Available,
            120,
        ),
        lab(
            "lab4",
            "Penetration Testing Methodology",
            "Step-by-step approach to conducting thorough penetration tests.",
            Difficulty::Advanced,
            LabStatus::ComingSoon,
            150,
        ),
        lab(
            "lab5",
            "Incident Response Simulation",
            "Real-world scenarios for practicing incident response procedures.",
            Difficulty::Advanced,
            LabStatus::Maintenance,
            180,
        ),
    ]
}
