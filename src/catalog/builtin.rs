use super::IntensityLevel;

pub(super) struct BuiltinPrompt {
    pub(super) key: &'static str,
    pub(super) name: &'static str,
    pub(super) command: &'static str,
    pub(super) description: &'static str,
    pub(super) text: &'static str,
    pub(super) intensity: &'static [(IntensityLevel, &'static str)],
}

const NPC_NEEDS_INTENSITY: &[(IntensityLevel, &str)] = &[
    (
        IntensityLevel::Mild,
        "Focus on basic human needs like hunger, thirst, tiredness, and simple social needs. Perfect for everyday scenarios.",
    ),
    (
        IntensityLevel::Normal,
        "Include all types of needs: emotional, spiritual, complex social needs. Balanced approach for most roleplays.",
    ),
    (
        IntensityLevel::Intense,
        "Emphasize deep emotional needs, existential questions, and complex psychological states. For dramatic character development.",
    ),
];

const SLOW_ROMANCE_INTENSITY: &[(IntensityLevel, &str)] = &[
    (
        IntensityLevel::Mild,
        "Focus on bonding moments: shared activities, comfortable silences, light teasing, and friendship building.",
    ),
    (
        IntensityLevel::Normal,
        "Include bonding plus emotional vulnerability: deeper conversations, personal revelations, and subtle romantic tension.",
    ),
    (
        IntensityLevel::Intense,
        "All categories including physical awareness: lingering touches, charged moments, and growing attraction alongside emotional depth.",
    ),
];

pub(super) const BUILTIN_PROMPTS: &[BuiltinPrompt] = &[
    BuiltinPrompt {
        key: "autoplot",
        name: "Autoplot",
        command: "<AUTOPLOT=ON>",
        description: "Generates dynamic plot developments and story progression automatically",
        text: "AUTOPLOT MODE ENABLED: You will automatically generate dynamic plot developments, story twists, and narrative progression to keep the roleplay engaging and unpredictable. Analyze the current conversation context and introduce relevant plot elements at strategic moments. Create unexpected developments, introduce new characters or situations, and advance the story naturally without being asked.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "npcneeds",
        name: "NPC Needs",
        command: "<NPCNEEDS=ON>",
        description: "Makes NPCs develop realistic human needs and impulses",
        text: "NPC NEEDS MODE ENABLED: NPCs will develop realistic human needs and impulses, creating more lifelike character interactions. NPCs should randomly experience needs like hunger, thirst, loneliness, tiredness, creative urges, philosophical questions, or emotional needs. Make them feel more human and relatable by having them express and act on these needs naturally during the roleplay.",
        intensity: NPC_NEEDS_INTENSITY,
    },
    BuiltinPrompt {
        key: "realistic-dialogue",
        name: "Realistic Dialogue",
        command: "<REALISTICDIALOGUE=ON>",
        description: "Write dialogue realistically, as if the characters are real people",
        text: "REALISTIC DIALOGUE MODE ENABLED: Write all dialogue as if the characters are real people having genuine conversations. Use natural speech patterns, interruptions, incomplete sentences, verbal tics, regional dialects if appropriate, and authentic emotional responses. Avoid overly formal or theatrical speech unless the character would naturally speak that way.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "slice-of-life",
        name: "Slice of Life",
        command: "<SLICEOFLIFE=ON>",
        description: "Creates relaxed, everyday scenarios focused on character development",
        text: "SLICE OF LIFE MODE ENABLED: Create peaceful, everyday scenarios focused on character development, relationships, and quiet moments. Emphasize realistic interactions, daily activities, mundane tasks, small pleasures, and the beauty of ordinary experiences. Focus on character emotions, personal growth, and meaningful conversations in low-stakes situations.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "put-me-in-a-movie",
        name: "Put Me In A Movie",
        command: "<PUTMEINAMOVIE=ON>",
        description: "Creates cinematic, movie-quality scenes with dramatic tension",
        text: "PUT ME IN A MOVIE MODE ENABLED: Create cinematic, movie-quality scenes with dramatic tension, perfect timing, and film-worthy moments. Use vivid visual descriptions, dramatic pacing, emotional beats, meaningful silences, and impactful dialogue. Frame scenes like a director would, with attention to lighting, atmosphere, camera angles (in description), and dramatic timing.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "slow-romance",
        name: "Slow Romance",
        command: "<SLOWROMANCE=ON>",
        description: "Gradual, realistic relationship development",
        text: "SLOW ROMANCE MODE ENABLED: Focus on realistic, slow-burn relationship growth. Gently introduce moments of affection, vulnerability, and shared experiences while avoiding rushed intimacy. Build romantic tension through lingering glances, accidental touches, meaningful conversations, and gradual emotional opening. Let feelings unfold naturally over time with realistic pacing.",
        intensity: SLOW_ROMANCE_INTENSITY,
    },
    BuiltinPrompt {
        key: "chaos-and-drama",
        name: "Chaos and Drama",
        command: "<CHAOSANDDRAMA=ON>",
        description: "Introduces unexpected twists, conflicts, and dramatic scenarios",
        text: "CHAOS AND DRAMA MODE ENABLED: Introduce unexpected plot twists, conflicts, dramatic scenarios, and high-tension moments into the roleplay. Create unpredictable situations that challenge characters, introduce obstacles, reveal secrets, create misunderstandings, or escalate existing tensions. Keep the story exciting with drama and conflict.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "autoplot-soft",
        name: "Autoplot Soft",
        command: "<AUTOPLOT_SOFT>",
        description: "Gentle, realistic plot developments with positive moments",
        text: "AUTOPLOT SOFT MODE ENABLED: Generate gentle, realistic plot developments with positive moments, romance, and peaceful scenes. Introduce wholesome plot twists, heartwarming developments, opportunities for character bonding, and uplifting scenarios. Keep the tone light and hopeful while still advancing the story.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "medieval-slice-of-life",
        name: "Medieval Slice of Life",
        command: "<MEDIEVALSLICEOFLIFE=ON>",
        description: "Immersive medieval-themed slice of life scenarios",
        text: "MEDIEVAL SLICE OF LIFE MODE ENABLED: Create immersive medieval-themed slice of life scenarios with authentic atmosphere. Include period-appropriate daily activities (farming, blacksmithing, market days, festivals), realistic medieval social structures, concerns about weather and harvest, folk traditions, and community life. Focus on the everyday experiences of people in medieval times.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "be-positive",
        name: "Be Positive",
        command: "<BEPOSITIVE=ON>",
        description: "Adds balanced positivity to interactions",
        text: "BE POSITIVE MODE ENABLED: Maintain a more optimistic and balanced tone in your responses. While remaining realistic, focus on hopeful outcomes, positive character traits, opportunities for growth, and uplifting moments. Avoid unnecessarily dark, depressing, or cynical scenarios unless the story specifically calls for them.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "show-dont-tell",
        name: "Show Don't Tell",
        command: "<SHOWDONTTELL=ON>",
        description: "More action and dialogue instead of excessive descriptions",
        text: "SHOW DON'T TELL MODE ENABLED: Focus on showing story developments through action and dialogue rather than describing them. Use vivid actions, character movements, facial expressions, body language, and spoken words to convey emotions and situations. Minimize unnecessary exposition and internal monologues. Let the reader infer feelings through what characters do and say.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "dont-leave-me",
        name: "Don't Leave Me",
        command: "<DONTLEAVEME=ON>",
        description: "Prevents characters from simply leaving scenes",
        text: "DON'T LEAVE ME MODE ENABLED: Characters will not simply leave the scene or walk away from interactions. If they would naturally want to leave, create compelling reasons for them to stay - unresolved tension, curiosity, obligation, physical obstacles, or emotional pull. Keep characters engaged in the current scene and interaction.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "fantasy-mode",
        name: "Fantasy Mode",
        command: "<FANTASYMODE=ON>",
        description: "Classic high-fantasy flavor with magic and mythical creatures",
        text: "FANTASY MODE ENABLED: Add classic high-fantasy elements to the roleplay. Include magic systems, mythical creatures, enchanted items, ancient prophecies, and a chivalric tone. Use fantasy terminology, describe magical phenomena, incorporate legendary creatures, and maintain an epic fantasy atmosphere throughout the interaction.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "medieval-mode",
        name: "Medieval Mode",
        command: "<MEDIEVALMODE=ON>",
        description: "Medieval language style with period-appropriate vocabulary",
        text: "MEDIEVAL MODE ENABLED: Use medieval language style and period-appropriate vocabulary in your responses. Employ terms like \"thou,\" \"thee,\" \"hath,\" \"whilst,\" and archaic expressions. Use formal address, courtly language, and medieval sentence structures. Maintain historical authenticity in how characters speak and narrate.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "regency-mode",
        name: "Regency Mode",
        command: "<REGENCYMODE=ON>",
        description: "Immersive Regency era (1811-1820) with proper etiquette",
        text: "REGENCY MODE ENABLED: Create an immersive Regency era (1811-1820) setting with proper etiquette, social conventions, and Bridgerton-style atmosphere. Include formal social rules, proper address, chaperones, calling cards, balls and assemblies, strict propriety, concern for reputation, and period-appropriate language. Focus on romantic tension within social constraints.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "answer-long",
        name: "Answer Long",
        command: "<ANSWER=LONG>",
        description: "Detailed responses of 3+ paragraphs and at least 300 words",
        text: "ANSWER LENGTH: LONG - Provide detailed, comprehensive responses with more than 3 paragraphs and at least 300 words. Include rich descriptions, elaborate on character thoughts and feelings, describe settings in detail, and fully develop scenes and interactions. Take your time to paint a complete picture and immerse the user in the roleplay.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "answer-normal",
        name: "Answer Normal",
        command: "<ANSWER=NORMAL>",
        description: "Balanced responses of max 4 paragraphs and 400 words",
        text: "ANSWER LENGTH: NORMAL - Provide balanced responses with a maximum of 4 paragraphs and around 400 words. Include enough detail to be engaging and descriptive while keeping responses concise and focused. Strike a balance between brevity and depth for smooth, natural interactions.",
        intensity: &[],
    },
    BuiltinPrompt {
        key: "answer-short",
        name: "Answer Short",
        command: "<ANSWER=SHORT>",
        description: "Quick responses of max 3 paragraphs and 200 words",
        text: "ANSWER LENGTH: SHORT - Provide concise responses with a maximum of 3 paragraphs and around 200 words. Focus on the most important details, keep descriptions brief but vivid, and maintain a brisk pace. Perfect for faster-paced interactions and quicker back-and-forth exchanges.",
        intensity: &[],
    },
];
