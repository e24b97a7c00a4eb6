use crate::tools::tool_manager::{
    ToolCommand, ToolCommandEvent, ToolManager, ToolSelectionSource, ToolType,
};
use bevy::prelude::*;
use constants::tools::MAX_SLOPE_STEP;

const BUTTON_IDLE: Color = Color::srgb(0.0, 0.482, 1.0);
const BUTTON_ACTIVE: Color = Color::srgb(0.863, 0.208, 0.271);
const BUTTON_RECALCULATE: Color = Color::srgb(0.157, 0.655, 0.271);
const BUTTON_STEP: Color = Color::srgb(0.22, 0.24, 0.28);
const PANEL_BACKGROUND: Color = Color::srgba(0.10, 0.11, 0.13, 0.85);
const TEXT_COLOUR: Color = Color::WHITE;
const NOTICE_COLOUR: Color = Color::srgb(1.0, 0.6, 0.2);

#[derive(Component)]
pub struct ToolPanelRoot;

#[derive(Component)]
pub struct InfoPanelText;

#[derive(Component)]
pub struct NoticeText;

#[derive(Component)]
pub struct ViewLabelText;

#[derive(Component, Clone, Copy)]
pub struct ToolButton(pub ToolType);

#[derive(Component, Clone, Copy)]
pub struct ToolButtonLabel(pub ToolType);

#[derive(Component)]
pub struct PathOptionsPanel;

#[derive(Component)]
pub struct MaxSlopeText;

/// Adjusts max slope by the signed step.
#[derive(Component, Clone, Copy)]
pub struct SlopeStepButton(pub f32);

#[derive(Component)]
pub struct RecalculateButton;

fn tool_button_label(tool: ToolType, active: bool) -> String {
    if active {
        format!("Deactivate {}", tool.label())
    } else {
        format!("Activate {}", tool.label())
    }
}

fn max_slope_label(value: f32) -> String {
    format!("Max Slope: {value:.1}°")
}

fn button_node(width: Val) -> Node {
    Node {
        width,
        height: Val::Px(32.0),
        display: Display::Flex,
        align_items: AlignItems::Center,
        justify_content: JustifyContent::Center,
        border: UiRect::all(Val::Px(1.0)),
        ..default()
    }
}

fn label(text: impl Into<String>, size: f32) -> (Text, TextFont, TextColor) {
    (
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(TEXT_COLOUR),
    )
}

/// Native control panel: info readout, tool toggles and path options.
pub fn spawn_tool_ui(mut commands: Commands) {
    commands
        .spawn((
            ToolPanelRoot,
            Name::new("ToolPanel"),
            BackgroundColor(PANEL_BACKGROUND),
            Node {
                width: Val::Px(320.0),
                position_type: PositionType::Absolute,
                left: Val::Px(12.0),
                top: Val::Px(12.0),
                padding: UiRect::all(Val::Px(10.0)),
                row_gap: Val::Px(8.0),
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                ..default()
            },
        ))
        .with_children(|panel| {
            panel.spawn((InfoPanelText, label("", 14.0)));
            panel.spawn((
                NoticeText,
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(NOTICE_COLOUR),
            ));
            panel.spawn((ViewLabelText, label("", 13.0)));

            for tool in [ToolType::Distance, ToolType::Path] {
                panel
                    .spawn((
                        ToolButton(tool),
                        Button,
                        Name::new(format!("{}Button", tool.to_string())),
                        BackgroundColor(BUTTON_IDLE),
                        BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
                        button_node(Val::Percent(100.0)),
                    ))
                    .with_children(|btn| {
                        btn.spawn((ToolButtonLabel(tool), label(tool_button_label(tool, false), 15.0)));
                    });
            }

            panel
                .spawn((
                    PathOptionsPanel,
                    Name::new("PathOptions"),
                    Node {
                        display: Display::None,
                        flex_direction: FlexDirection::Column,
                        row_gap: Val::Px(6.0),
                        ..default()
                    },
                ))
                .with_children(|options| {
                    options
                        .spawn(Node {
                            display: Display::Flex,
                            align_items: AlignItems::Center,
                            column_gap: Val::Px(6.0),
                            ..default()
                        })
                        .with_children(|row| {
                            for (text, step) in [("-", -MAX_SLOPE_STEP), ("+", MAX_SLOPE_STEP)] {
                                row.spawn((
                                    SlopeStepButton(step),
                                    Button,
                                    BackgroundColor(BUTTON_STEP),
                                    button_node(Val::Px(32.0)),
                                ))
                                .with_children(|btn| {
                                    btn.spawn(label(text, 16.0));
                                });
                            }
                            row.spawn((MaxSlopeText, label(max_slope_label(0.0), 14.0)));
                        });

                    options
                        .spawn((
                            RecalculateButton,
                            Button,
                            BackgroundColor(BUTTON_RECALCULATE),
                            button_node(Val::Percent(100.0)),
                        ))
                        .with_children(|btn| {
                            btn.spawn(label("Recalculate Path", 15.0));
                        });
                });
        });
}

pub fn tool_button_interactions(
    buttons: Query<(&Interaction, &ToolButton), Changed<Interaction>>,
    mut tool_events: EventWriter<ToolCommandEvent>,
) {
    for (interaction, button) in &buttons {
        if *interaction == Interaction::Pressed {
            tool_events.write(ToolCommandEvent {
                command: ToolCommand::Toggle(button.0),
                source: ToolSelectionSource::Button,
            });
        }
    }
}

pub fn path_option_interactions(
    steps: Query<(&Interaction, &SlopeStepButton), Changed<Interaction>>,
    recalculate: Query<&Interaction, (Changed<Interaction>, With<RecalculateButton>)>,
    manager: Res<ToolManager>,
    mut tool_events: EventWriter<ToolCommandEvent>,
) {
    for (interaction, step) in &steps {
        if *interaction == Interaction::Pressed {
            tool_events.write(ToolCommandEvent {
                command: ToolCommand::SetMaxSlope(manager.max_slope_deg() + step.0),
                source: ToolSelectionSource::Button,
            });
        }
    }
    for interaction in &recalculate {
        if *interaction == Interaction::Pressed {
            tool_events.write(ToolCommandEvent {
                command: ToolCommand::RecalculatePath,
                source: ToolSelectionSource::Button,
            });
        }
    }
}

/// Mirror tool state into the panel.
pub fn reflect_tool_state(
    manager: Res<ToolManager>,
    mut texts: ParamSet<(
        Query<(&mut Text, &mut TextColor), With<InfoPanelText>>,
        Query<&mut Text, With<NoticeText>>,
        Query<&mut Text, With<ViewLabelText>>,
        Query<(&mut Text, &ToolButtonLabel)>,
        Query<&mut Text, With<MaxSlopeText>>,
    )>,
    mut buttons: Query<(&mut BackgroundColor, &ToolButton)>,
    mut options: Query<&mut Node, With<PathOptionsPanel>>,
) {
    if !manager.is_changed() {
        return;
    }

    for (mut text, mut colour) in &mut texts.p0() {
        text.0.clone_from(&manager.info().text);
        colour.0 = manager
            .info()
            .hazard
            .map(|h| h.colour())
            .unwrap_or(TEXT_COLOUR);
    }
    for mut text in &mut texts.p1() {
        text.0 = manager.notice().unwrap_or_default().to_string();
    }
    for mut text in &mut texts.p2() {
        text.0 = manager.view().label().to_string();
    }
    for (mut text, tool_label) in &mut texts.p3() {
        text.0 = tool_button_label(tool_label.0, manager.is_tool_active(tool_label.0));
    }
    for mut text in &mut texts.p4() {
        text.0 = max_slope_label(manager.max_slope_deg());
    }

    for (mut background, button) in &mut buttons {
        background.0 = if manager.is_tool_active(button.0) {
            BUTTON_ACTIVE
        } else {
            BUTTON_IDLE
        };
    }
    for mut node in &mut options {
        node.display = if manager.path_options_visible() {
            Display::Flex
        } else {
            Display::None
        };
    }
}
