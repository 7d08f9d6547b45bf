//! Seed the catalog with sample categories and projects.
//!
//! Rows are matched by name/title, so running the command twice is a no-op.

use rust_decimal::Decimal;
use tracing::info;

use studybot_bot::db::{CategoryRepository, ProjectRepository};
use studybot_bot::models::{NewCategory, NewProject, ProjectUpdate};
use studybot_core::{CategoryId, Price, ProjectLevel, ProjectType};

use super::{CommandError, connect};

struct SampleCategory {
    name: &'static str,
    icon: &'static str,
    description: &'static str,
}

struct SampleProject {
    title: &'static str,
    category: &'static str,
    project_type: ProjectType,
    level: ProjectLevel,
    languages: &'static str,
    technologies: &'static str,
    price: i64,
    discount: Option<i64>,
    description: &'static str,
}

const CATEGORIES: &[SampleCategory] = &[
    SampleCategory {
        name: "Python",
        icon: "🐍",
        description: "Bots, backends, data processing and machine learning",
    },
    SampleCategory {
        name: "JavaScript",
        icon: "📜",
        description: "Frontend and Node.js projects",
    },
    SampleCategory {
        name: "Java",
        icon: "☕",
        description: "Desktop and server applications",
    },
    SampleCategory {
        name: "C++",
        icon: "🔧",
        description: "Games, algorithms and systems programming",
    },
    SampleCategory {
        name: "Web",
        icon: "🌐",
        description: "Websites and web applications",
    },
];

const PROJECTS: &[SampleProject] = &[
    SampleProject {
        title: "Telegram shop bot",
        category: "Python",
        project_type: ProjectType::Project,
        level: ProjectLevel::Advanced,
        languages: "Python",
        technologies: "aiogram, PostgreSQL",
        price: 8_000,
        discount: Some(6_500),
        description: "Online store inside Telegram with a catalog, cart and admin panel.",
    },
    SampleProject {
        title: "Warehouse management system",
        category: "Python",
        project_type: ProjectType::Diploma,
        level: ProjectLevel::Intermediate,
        languages: "Python",
        technologies: "Django, PostgreSQL",
        price: 12_000,
        discount: None,
        description: "Stock tracking, receipts and shipments with reports. Includes the thesis text.",
    },
    SampleProject {
        title: "Portfolio website",
        category: "Web",
        project_type: ProjectType::Project,
        level: ProjectLevel::Basic,
        languages: "HTML, CSS, JavaScript",
        technologies: "Bootstrap",
        price: 3_000,
        discount: None,
        description: "Responsive one-page portfolio with a contact form.",
    },
    SampleProject {
        title: "React online store",
        category: "JavaScript",
        project_type: ProjectType::Diploma,
        level: ProjectLevel::Advanced,
        languages: "JavaScript",
        technologies: "React, Node.js, MongoDB",
        price: 15_000,
        discount: Some(13_000),
        description: "Full-stack store with product pages, a cart and order history.",
    },
    SampleProject {
        title: "REST API for a social network",
        category: "Python",
        project_type: ProjectType::Coursework,
        level: ProjectLevel::Advanced,
        languages: "Python",
        technologies: "FastAPI, SQLAlchemy",
        price: 7_000,
        discount: None,
        description: "Users, posts, comments and likes with JWT authentication.",
    },
    SampleProject {
        title: "Snake game in C++",
        category: "C++",
        project_type: ProjectType::Project,
        level: ProjectLevel::Intermediate,
        languages: "C++",
        technologies: "SFML",
        price: 4_000,
        discount: None,
        description: "Classic snake with levels and a high score table.",
    },
    SampleProject {
        title: "Java calculator",
        category: "Java",
        project_type: ProjectType::Project,
        level: ProjectLevel::Basic,
        languages: "Java",
        technologies: "Swing",
        price: 2_500,
        discount: None,
        description: "Desktop calculator with memory and operation history.",
    },
    SampleProject {
        title: "Python basics presentation",
        category: "Python",
        project_type: ProjectType::Presentation,
        level: ProjectLevel::Basic,
        languages: "Python",
        technologies: "PowerPoint",
        price: 1_500,
        discount: None,
        description: "25 slides on syntax, data types and control flow with examples.",
    },
    SampleProject {
        title: "ML chatbot",
        category: "Python",
        project_type: ProjectType::Diploma,
        level: ProjectLevel::Advanced,
        languages: "Python",
        technologies: "scikit-learn, NLTK, Flask",
        price: 18_000,
        discount: None,
        description: "Intent classification chatbot with a web interface and training scripts.",
    },
    SampleProject {
        title: "CRM for small business",
        category: "Web",
        project_type: ProjectType::Diploma,
        level: ProjectLevel::Advanced,
        languages: "PHP, JavaScript",
        technologies: "Laravel, Vue.js, MySQL",
        price: 16_000,
        discount: None,
        description: "Clients, deals and tasks with role-based access.",
    },
];

/// Insert the sample catalog, skipping rows that already exist.
///
/// # Errors
///
/// Returns error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool);
    let projects = ProjectRepository::new(&pool);

    let mut category_ids: Vec<(&str, CategoryId)> = Vec::with_capacity(CATEGORIES.len());
    let mut created = 0_usize;

    for sample in CATEGORIES {
        let category = match categories.get_by_name(sample.name).await? {
            Some(existing) => existing,
            None => {
                created += 1;
                categories
                    .create(&NewCategory {
                        name: sample.name.to_owned(),
                        description: Some(sample.description.to_owned()),
                        icon: Some(sample.icon.to_owned()),
                    })
                    .await?
            }
        };
        category_ids.push((sample.name, category.id));
    }
    info!("Categories: {created} created, {} existing", CATEGORIES.len() - created);

    created = 0;
    for sample in PROJECTS {
        if projects.get_by_title(sample.title).await?.is_some() {
            continue;
        }

        let category_id = category_ids
            .iter()
            .find(|(name, _)| *name == sample.category)
            .map(|(_, id)| *id)
            .ok_or_else(|| {
                CommandError::Invalid(format!("Unknown sample category: {}", sample.category))
            })?;

        let project = projects
            .create(&NewProject {
                title: sample.title.to_owned(),
                description: sample.description.to_owned(),
                category_id,
                project_type: sample.project_type,
                level: sample.level,
                programming_languages: Some(sample.languages.to_owned()),
                technologies: Some(sample.technologies.to_owned()),
                price: Price::from_amount(Decimal::from(sample.price)),
            })
            .await?;

        if let Some(discount) = sample.discount {
            projects
                .update(
                    project.id,
                    &ProjectUpdate::DiscountPrice(Some(Price::from_amount(Decimal::from(
                        discount,
                    )))),
                )
                .await?;
        }
        created += 1;
    }
    info!("Projects: {created} created, {} existing", PROJECTS.len() - created);

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_projects_reference_known_categories() {
        for project in PROJECTS {
            assert!(
                CATEGORIES.iter().any(|c| c.name == project.category),
                "{} has unknown category {}",
                project.title,
                project.category
            );
        }
    }

    #[test]
    fn test_sample_discounts_below_price() {
        for project in PROJECTS {
            if let Some(discount) = project.discount {
                assert!(discount > 0 && discount < project.price, "{}", project.title);
            }
        }
    }
}
